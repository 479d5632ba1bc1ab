/// Blessing content: the items a freshly opened envelope can reveal.
///
/// The pool is an ordered, non-empty list. Each `open` draws one item
/// uniformly at random; draws are independent (no sampling without
/// replacement, no memoization).

use rand::Rng;

use crate::error::ConfigError;

/// One selectable video + title pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlessingItem {
    pub source: String,
    pub title: String,
}

impl BlessingItem {
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        BlessingItem { source: source.into(), title: title.into() }
    }
}

/// Ordered pool with at least one item.
#[derive(Clone, Debug)]
pub struct BlessingPool {
    items: Vec<BlessingItem>,
}

impl BlessingPool {
    pub fn new(items: Vec<BlessingItem>) -> Result<Self, ConfigError> {
        if items.is_empty() {
            return Err(ConfigError::EmptyPool);
        }
        Ok(BlessingPool { items })
    }

    /// The five stock blessings.
    pub fn builtin() -> Self {
        BlessingPool {
            items: vec![
                BlessingItem::new("/blessing1.mp4", "大吉大利"),
                BlessingItem::new("/blessing2.mp4", "财源广进"),
                BlessingItem::new("/blessing3.mp4", "万事如意"),
                BlessingItem::new("/blessing4.mp4", "心想事成"),
                BlessingItem::new("/blessing5.mp4", "福星高照"),
            ],
        }
    }

    /// Uniform draw over `[0, len)`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &BlessingItem {
        &self.items[rng.gen_range(0..self.items.len())]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[BlessingItem] {
        &self.items
    }
}

impl Default for BlessingPool {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn empty_pool_rejected() {
        assert!(matches!(BlessingPool::new(vec![]), Err(ConfigError::EmptyPool)));
    }

    #[test]
    fn single_item_pool_always_draws_it() {
        let pool = BlessingPool::new(vec![BlessingItem::new("/only.mp4", "唯一")]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(pool.draw(&mut rng).source, "/only.mp4");
        }
    }

    #[test]
    fn builtin_pool_has_five_literal_pairs() {
        let pool = BlessingPool::builtin();
        assert_eq!(pool.len(), 5);
        assert!(pool.items().contains(&BlessingItem::new("/blessing3.mp4", "万事如意")));
    }

    #[test]
    fn draws_are_uniform_chi_square() {
        let pool = BlessingPool::builtin();
        let mut rng = StdRng::seed_from_u64(2026);
        let draws = 10_000usize;
        let mut counts = vec![0usize; pool.len()];
        for _ in 0..draws {
            let item = pool.draw(&mut rng);
            let idx = pool.items().iter().position(|i| i == item).unwrap();
            counts[idx] += 1;
        }

        let expected = draws as f64 / pool.len() as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - expected;
                d * d / expected
            })
            .sum();
        // df = 4, p = 0.001 critical value
        assert!(chi2 < 18.467, "chi-square {chi2} too large, counts {counts:?}");
        assert!(counts.iter().all(|&c| c > 0));
    }
}
