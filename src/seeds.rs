//! Built-in topics used whenever the spreadsheet cannot provide a dataset.

use crate::domain::Topic;

/// Fallback dataset: ten topics across seven categories, all enabled.
pub fn fallback_topics() -> Vec<Topic> {
  vec![
    Topic::new("1", "貯める", "最近節約できたことは？", 5),
    Topic::new("2", "軽い雑談", "朝ごはんはパン派？ご飯派？", 3),
    Topic::new("3", "増やす", "10年後の自分に言いたいことは？", 0),
    Topic::new("4", "稼ぐ", "理想の年収は？", 8),
    Topic::new("5", "守る", "セキュリティ対策してる？", 1),
    Topic::new("6", "使う", "最近買った一番の高価なものは？", 12),
    Topic::new("7", "リベネタ", "人生で一番影響を受けた本は？", 4),
    Topic::new("8", "軽い雑談", "最近見たYouTube動画は？", 9),
    Topic::new("9", "リベネタ", "理想のリーダー像とは？", 2),
    Topic::new("10", "軽い雑談", "透明人間になれたら何する？", 6),
  ]
}
