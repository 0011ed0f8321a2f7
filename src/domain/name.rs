//! Cluster name pool.

/// Default cluster identifiers, handed out in order.
pub const DEFAULT_CLUSTER_NAMES: [&str; 26] = [
    "Arbok",
    "Bulbasaur",
    "Charmander",
    "Diglett",
    "Eevee",
    "Fennekin",
    "Gengar",
    "Houndoom",
    "Inkay",
    "Jigglypuff",
    "Koffing",
    "Lickitung",
    "Machamp",
    "Nidoran",
    "Omanyte",
    "Pikachu",
    "Quagsire",
    "Ralts",
    "Snorlax",
    "Togepi",
    "Umbreon",
    "Vanillite",
    "Wooloo",
    "Xatu",
    "Yanma",
    "Zorua",
];

/// Ordered pool of cluster names, each drawn at most once.
#[derive(Debug, Clone)]
pub struct NamePool {
    names: Vec<String>,
    cursor: usize,
}

impl NamePool {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self { names, cursor: 0 }
    }

    /// Total names in the pool, drawn or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names not yet drawn.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.names.len() - self.cursor
    }
}

impl Default for NamePool {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_NAMES.iter().map(|s| (*s).to_string()).collect())
    }
}

impl Iterator for NamePool {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let name = self.names.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_in_pool_order() {
        let mut pool = NamePool::default();
        assert_eq!(pool.next().as_deref(), Some("Arbok"));
        assert_eq!(pool.next().as_deref(), Some("Bulbasaur"));
        assert_eq!(pool.remaining(), 24);
    }

    #[test]
    fn exhausts_without_repeating() {
        let mut pool = NamePool::new(vec!["A".into(), "B".into()]);
        assert_eq!(pool.next().as_deref(), Some("A"));
        assert_eq!(pool.next().as_deref(), Some("B"));
        assert_eq!(pool.next(), None);
        assert_eq!(pool.next(), None);
    }
}
