// ============================================================
// Layer 3 - Dataset Split
// ============================================================
// Index lists into a graph collection. OGB ships a fixed
// scaffold split per dataset; indices refer to the order in
// which graphs appear in the raw files.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Which part of a split to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Train,
    Valid,
    Test,
}

impl std::fmt::Display for SplitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SplitKind::Train => "train",
            SplitKind::Valid => "valid",
            SplitKind::Test  => "test",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
    pub test:  Vec<usize>,
}

impl SplitIndices {
    pub fn new(train: Vec<usize>, valid: Vec<usize>, test: Vec<usize>) -> Self {
        Self { train, valid, test }
    }

    pub fn len_total(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    pub fn get(&self, kind: SplitKind) -> &[usize] {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Valid => &self.valid,
            SplitKind::Test  => &self.test,
        }
    }

    /// Every index must refer to one of `num_graphs` graphs.
    pub fn validate(&self, num_graphs: usize) -> Result<()> {
        for (name, part) in [("train", &self.train), ("valid", &self.valid), ("test", &self.test)] {
            if let Some(&bad) = part.iter().find(|&&i| i >= num_graphs) {
                bail!("{name} split index {bad} is out of range for {num_graphs} graphs");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_in_range() {
        let s = SplitIndices::new(vec![0, 1], vec![2], vec![3]);
        assert_eq!(s.len_total(), 4);
        assert!(s.validate(4).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let s = SplitIndices::new(vec![0], vec![], vec![7]);
        let err = s.validate(4).unwrap_err().to_string();
        assert!(err.contains("test"));
    }

    #[test]
    fn test_get_selects_part() {
        let s = SplitIndices::new(vec![0, 1], vec![2], vec![3, 4, 5]);
        assert_eq!(s.get(SplitKind::Train), &[0, 1]);
        assert_eq!(s.get(SplitKind::Valid), &[2]);
        assert_eq!(s.get(SplitKind::Test).len(), 3);
        assert_eq!(SplitKind::Valid.to_string(), "valid");
    }
}
