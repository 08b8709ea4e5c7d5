//! Caret positioning within a block and caret travel between blocks.

pub mod measure;
pub mod navigation;
pub mod position;

pub use measure::{MonospaceMeasure, Rect, TextMeasure};
pub use navigation::{
    Caret, Navigation, NavigationSettings, PendingTransfer, VerticalDirection, VerticalPlan,
    arrow_left, arrow_right, arrow_vertical, is_on_edge_line, plan_vertical,
};
pub use position::{CaretPosition, InlineSnapshot, Leaf};
