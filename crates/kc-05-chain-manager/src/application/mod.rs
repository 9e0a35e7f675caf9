//! Application services of the chain manager

mod attach_service;
mod chain_manager;
mod creation_service;

pub use attach_service::BlockAttachService;
pub use chain_manager::ChainManager;
pub use creation_service::ChainCreationService;
