use std::collections::BTreeSet;
use tracing::trace;

/// タグの変更イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    Added(String),
    Removed(String),
}

/// フラットなタグ集合
///
/// ステートの入退出をデバッグ/UI向けに通知するための観測チャネルです。
/// 正しさには影響しません。変更は順序付きジャーナルに記録されます。
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: BTreeSet<String>,
    journal: Vec<TagEvent>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: &str) {
        if self.tags.insert(tag.to_string()) {
            trace!(tag = tag, "TAG_ADDED");
        }
        self.journal.push(TagEvent::Added(tag.to_string()));
    }

    pub fn remove(&mut self, tag: &str) {
        if self.tags.remove(tag) {
            trace!(tag = tag, "TAG_REMOVED");
        }
        self.journal.push(TagEvent::Removed(tag.to_string()));
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// 接頭辞が一致するタグが存在するか
    #[cfg(test)]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.tags.iter().any(|t| t.starts_with(prefix))
    }

    /// 接頭辞が一致するタグ一覧
    pub fn matching(&self, prefix: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    pub fn journal(&self) -> &[TagEvent] {
        &self.journal
    }

    #[cfg(test)]
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_query() {
        let mut tags = TagSet::new();
        tags.add("Enemy.State.MoveToTarget");
        tags.add("Enemy.Domain.Space");

        assert!(tags.has_prefix("Enemy.State"));
        assert_eq!(tags.matching("Enemy.State"), vec!["Enemy.State.MoveToTarget"]);
        assert!(!tags.has_prefix("Turret"));

        tags.remove("Enemy.State.MoveToTarget");
        assert!(!tags.has_prefix("Enemy.State"));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.journal().len(), 3);
    }
}
