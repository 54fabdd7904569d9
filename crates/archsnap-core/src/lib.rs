//! archsnap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the archsnap snapshot
//! pipeline. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: 3D points, sizes and bounding boxes ([`geometry`] module)
//! - **Semantic**: Input records describing an architecture ([`semantic`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod semantic;
