use crate::error::{Error, Result};

struct Rule<T: ?Sized> {
    name: String,
    enabled: bool,
    rule: Box<T>,
}

/// An ordered, named list of rules.
///
/// Extensions insert their rules relative to existing ones, so the final
/// order does not depend on the order extensions are added in.
pub struct Ruler<T: ?Sized> {
    rules: Vec<Rule<T>>,
}

impl<T: ?Sized> Default for Ruler<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: ?Sized> Ruler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.rules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::RuleNotFound(name.to_string()))
    }

    fn insert(&mut self, index: usize, name: &str, rule: Box<T>) {
        log::debug!("installing rule `{name}`");
        self.rules.insert(
            index,
            Rule {
                name: name.to_string(),
                enabled: true,
                rule,
            },
        );
    }

    /// Append a rule at the end of the chain.
    pub fn push(&mut self, name: &str, rule: Box<T>) {
        self.insert(self.rules.len(), name, rule);
    }

    /// Insert a rule directly before `anchor`.
    pub fn before(&mut self, anchor: &str, name: &str, rule: Box<T>) -> Result<()> {
        let index = self.index_of(anchor)?;
        self.insert(index, name, rule);
        Ok(())
    }

    /// Insert a rule directly after `anchor`.
    pub fn after(&mut self, anchor: &str, name: &str, rule: Box<T>) -> Result<()> {
        let index = self.index_of(anchor)?;
        self.insert(index + 1, name, rule);
        Ok(())
    }

    pub fn disable(&mut self, name: &str) -> Result<()> {
        let index = self.index_of(name)?;
        self.rules[index].enabled = false;
        Ok(())
    }

    pub fn enable(&mut self, name: &str) -> Result<()> {
        let index = self.index_of(name)?;
        self.rules[index].enabled = true;
        Ok(())
    }

    /// Enabled rules, in order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &T)> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .map(|r| (r.name.as_str(), &*r.rule))
    }

    /// Names of all rules, enabled or not.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Named = dyn Fn() -> u8;

    fn ruler() -> Ruler<Named> {
        let mut ruler: Ruler<Named> = Ruler::new();
        ruler.push("a", Box::new(|| 1));
        ruler.push("c", Box::new(|| 3));
        ruler
    }

    #[test]
    fn insertion_relative_to_anchors() {
        let mut ruler = ruler();
        ruler.after("a", "b", Box::new(|| 2)).unwrap();
        ruler.before("a", "start", Box::new(|| 0)).unwrap();
        assert_eq!(ruler.names(), vec!["start", "a", "b", "c"]);
        let values: Vec<u8> = ruler.active().map(|(_, r)| r()).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn unknown_anchor_is_an_error() {
        let mut ruler = ruler();
        let err = ruler.after("missing", "x", Box::new(|| 9)).unwrap_err();
        assert!(matches!(err, Error::RuleNotFound(name) if name == "missing"));
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let mut ruler = ruler();
        ruler.disable("a").unwrap();
        let names: Vec<&str> = ruler.active().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["c"]);

        ruler.enable("a").unwrap();
        assert_eq!(ruler.active().count(), 2);
        assert!(ruler.disable("zzz").is_err());
    }
}
