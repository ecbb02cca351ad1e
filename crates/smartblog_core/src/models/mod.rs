//! Data models exchanged with the persistence collaborator.

pub mod post;
