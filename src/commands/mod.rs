mod admin;
mod blocking_pop;
mod command_error;
mod command_handler;
pub mod command_utils;
mod hashes;
mod keys;
mod lists;
mod pub_sub;
mod scan;
mod sets;
mod sorted_sets;
mod strings;

pub use command_error::CommandError;
pub use command_handler::{CommandContext, CommandHandler, CommandResult};
