//! Services layer for Prism
//!
//! HTTP clients for the external collaborators: the workflow engine that
//! answers questions about documents, and the storage provider that holds
//! the knowledge base it indexes.

pub mod drive;
pub mod workflow;

pub use drive::{DriveClient, DriveUpload};
pub use workflow::{ChatQuery, ProxyError, ProxyReply, WorkflowClient};
