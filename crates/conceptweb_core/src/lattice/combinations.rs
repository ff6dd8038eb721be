//! Fixed-size subset enumeration.

/// Iterates every `k`-element subset of `items` in lexicographic index order.
///
/// Each subset keeps the relative order of `items`. `k == 0` or `k > len`
/// yields nothing.
pub struct Combinations<'a, T> {
    items: &'a [T],
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T> Combinations<'a, T> {
    pub fn new(items: &'a [T], k: usize) -> Self {
        Self {
            items,
            indices: (0..k).collect(),
            done: k == 0 || k > items.len(),
        }
    }
}

impl<T: Clone> Iterator for Combinations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self
            .indices
            .iter()
            .map(|&index| self.items[index].clone())
            .collect();

        let n = self.items.len();
        let k = self.indices.len();
        // Rightmost index that can still move forward.
        match (0..k).rev().find(|&i| self.indices[i] < n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::Combinations;

    #[test]
    fn enumerates_in_lexicographic_order() {
        let items = ["a", "b", "c", "d"];
        let pairs: Vec<Vec<&str>> = Combinations::new(&items, 2).collect();
        assert_eq!(
            pairs,
            vec![
                vec!["a", "b"],
                vec!["a", "c"],
                vec!["a", "d"],
                vec!["b", "c"],
                vec!["b", "d"],
                vec!["c", "d"],
            ]
        );
    }

    #[test]
    fn counts_match_binomial_coefficients() {
        let items: Vec<u32> = (0..6).collect();
        let expected = [0, 6, 15, 20, 15, 6, 1];
        for (k, count) in expected.iter().enumerate() {
            let produced = Combinations::new(&items, k).count();
            assert_eq!(produced, *count, "C(6, {k})");
        }
    }

    #[test]
    fn out_of_range_sizes_yield_nothing() {
        let items = [1, 2];
        assert_eq!(Combinations::new(&items, 3).count(), 0);
        let empty: [u8; 0] = [];
        assert_eq!(Combinations::new(&empty, 1).count(), 0);
    }
}
