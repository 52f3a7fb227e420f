//! HTTP 请求处理器模块

pub mod category_tree;
pub mod health;
pub mod subcategory;
