use alloy::sol;

pub use commands::{
    CommandType, ADDRESS_THIS, COMMAND_TYPE_MASK, FLAG_ALLOW_REVERT, MSG_SENDER,
    SOURCE_MSG_SENDER, SOURCE_ROUTER,
};
pub use path::encode_path;
pub use planner::RoutePlanner;

/// The fixed command byte enumeration and its ABI schema table.
mod commands;

/// Packed V3 swap path encoding.
mod path;

/// The append-only command plan builder.
mod planner;

sol! {
    /// The command-interpreting swap router. `commands` and `inputs` are
    /// produced by a [`RoutePlanner`] and executed in order, atomically
    /// unless a command carries the allow-revert flag.
    interface ISwapRouter {
        function execute(
            bytes calldata commands,
            bytes[] calldata inputs,
            uint256 deadline
        ) external payable;
    }
}

/// Errors that can occur while building a route plan.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The allow-revert flag was requested for a command outside the
    /// revert-tolerant set.
    #[error("command {0:?} is not revert tolerant")]
    NotRevertTolerant(CommandType),
    /// The provided parameters do not match the command's ABI schema.
    #[error("input mismatch for command {command:?}: {message}")]
    InputMismatch {
        /// The command whose schema was violated.
        command: CommandType,
        /// What specifically failed to line up.
        message: String,
    },
    /// A swap path was structurally invalid.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}
