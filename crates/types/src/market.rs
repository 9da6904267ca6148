use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// One exchange. Each market owns exactly one backing store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Market {
    /// Shanghai
    SH,
    /// Shenzhen
    SZ,
}

impl Market {
    pub const COUNT: usize = 2;
    pub const ALL: [Market; Market::COUNT] = [Market::SH, Market::SZ];

    /// Resolve a two-character market tag, case-insensitive.
    #[inline]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "SH" => Some(Market::SH),
            "SZ" => Some(Market::SZ),
            _ => None,
        }
    }

    /// File name of the market's backing store inside the store directory.
    pub fn store_file(&self) -> &'static str {
        match self {
            Market::SH => "data_sh.db",
            Market::SZ => "data_sz.db",
        }
    }

    /// The market's benchmark index code. Appending it advances the
    /// last-update watermark; no other code does.
    pub fn index_code(&self) -> &'static str {
        match self {
            Market::SH => "SH000001",
            Market::SZ => "SZ399001",
        }
    }
}

/// Fixed-size map keyed by [`Market`]. Replaces a string-keyed dictionary so
/// an unknown market cannot be inserted or looked up.
#[derive(Debug)]
pub struct MarketMap<T> {
    slots: [Option<T>; Market::COUNT],
}

impl<T> Default for MarketMap<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> MarketMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, market: Market, value: T) -> Option<T> {
        self.slots[market as usize].replace(value)
    }

    pub fn remove(&mut self, market: Market) -> Option<T> {
        self.slots[market as usize].take()
    }

    pub fn get(&self, market: Market) -> Option<&T> {
        self.slots[market as usize].as_ref()
    }

    pub fn get_mut(&mut self, market: Market) -> Option<&mut T> {
        self.slots[market as usize].as_mut()
    }

    pub fn contains(&self, market: Market) -> bool {
        self.slots[market as usize].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Present entries in the fixed market order.
    pub fn iter(&self) -> impl Iterator<Item = (Market, &T)> {
        Market::ALL
            .iter()
            .filter_map(move |m| self.get(*m).map(|v| (*m, v)))
    }

    /// Markets with an entry, in the fixed order.
    pub fn markets(&self) -> impl Iterator<Item = Market> + '_ {
        Market::ALL.iter().copied().filter(|m| self.contains(*m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_resolution() {
        assert_eq!(Market::from_tag("SH"), Some(Market::SH));
        assert_eq!(Market::from_tag("sz"), Some(Market::SZ));
        assert_eq!(Market::from_tag("XX"), None);
        assert_eq!(Market::from_tag(""), None);
    }

    #[test]
    fn map_insert_get_iter() {
        let mut map = MarketMap::new();
        assert!(map.is_empty());
        assert_eq!(map.insert(Market::SZ, 10), None);
        assert_eq!(map.insert(Market::SZ, 11), Some(10));
        map.insert(Market::SH, 7);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(Market::SH), Some(&7));
        // iteration follows the fixed market order, not insertion order
        let seen: Vec<_> = map.iter().map(|(m, v)| (m, *v)).collect();
        assert_eq!(seen, vec![(Market::SH, 7), (Market::SZ, 11)]);
        assert_eq!(map.remove(Market::SH), Some(7));
        assert!(!map.contains(Market::SH));
    }
}
