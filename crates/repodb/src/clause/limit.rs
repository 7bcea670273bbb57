use super::Clause;

/// `LIMIT [offset, ]limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    limit: u64,
    offset: Option<u64>,
}

impl Limit {
    pub fn new(limit: u64, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl Clause for Limit {
    fn render(&self) -> String {
        match self.offset {
            Some(offset) => format!(" LIMIT {offset}, {}", self.limit),
            None => format!(" LIMIT {}", self.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_comes_first() {
        assert_eq!(Limit::new(10, Some(5)).render(), " LIMIT 5, 10");
        assert_eq!(Limit::new(1, None).render(), " LIMIT 1");
        assert_eq!(Limit::new(10, Some(0)).render(), " LIMIT 0, 10");
    }
}
