//! 子分类层级领域模型

pub mod locale;
pub mod subcategory;
pub mod tree;

pub use locale::{Locale, LocalizedText};
pub use subcategory::{
    LevelAssignment, NewSubcategory, SubcategoryFilter, SubcategoryNode, SubcategoryPatch,
    SubtreeMove,
};
pub use tree::{Breadcrumb, BreadcrumbKind, CategorySummary, DescendantNode, TreeNode};
