use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Bytes;

use super::{CommandType, RouterError, FLAG_ALLOW_REVERT};

/// An append-only plan of router commands.
///
/// Each [`add_command`](Self::add_command) appends one byte to the command
/// string and one ABI blob to the inputs; the interpreter executes them in
/// that order. The two sequences always have equal length. A plan under
/// construction belongs to a single assembling flow; once finished it is
/// handed read-only to the signer and submitter.
#[derive(Clone, Debug, Default)]
pub struct RoutePlanner {
    commands: Vec<u8>,
    inputs: Vec<Bytes>,
}

impl RoutePlanner {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `command` with `parameters` encoded against its schema row.
    ///
    /// `allow_revert` sets the top bit of the command byte so the
    /// interpreter tolerates this command failing; only commands in the
    /// revert-tolerant set accept it.
    ///
    /// # Errors
    /// - `RouterError::NotRevertTolerant` when `allow_revert` is requested
    ///   for a command outside the revert-tolerant set.
    /// - `RouterError::InputMismatch` when `parameters` do not match the
    ///   command's schema in arity or type.
    pub fn add_command(
        &mut self,
        command: CommandType,
        parameters: &[DynSolValue],
        allow_revert: bool,
    ) -> Result<(), RouterError> {
        if allow_revert && !command.allows_revert() {
            return Err(RouterError::NotRevertTolerant(command));
        }

        let schema = command.abi_schema();
        if schema.len() != parameters.len() {
            return Err(RouterError::InputMismatch {
                command,
                message: format!(
                    "expected {} parameters, got {}",
                    schema.len(),
                    parameters.len()
                ),
            });
        }
        for (index, (expected, value)) in
            schema.iter().zip(parameters).enumerate()
        {
            if !expected.matches(value) {
                return Err(RouterError::InputMismatch {
                    command,
                    message: format!("parameter {index} is not a {expected}"),
                });
            }
        }

        let input = DynSolValue::Tuple(parameters.to_vec()).abi_encode_params();

        let mut command_byte = command.as_byte();
        if allow_revert {
            command_byte |= FLAG_ALLOW_REVERT;
        }
        self.commands.push(command_byte);
        self.inputs.push(input.into());
        Ok(())
    }

    /// Embeds a finished plan as a single revert-tolerant nested command.
    ///
    /// The sub-plan's internal failure will not abort this plan, which is
    /// the only partial-failure isolation the interpreter offers.
    ///
    /// # Errors
    /// - `RouterError::InputMismatch` if the sub-plan's parts cannot be
    ///   encoded (not reachable for plans built through this type).
    pub fn add_sub_plan(&mut self, sub_plan: &Self) -> Result<(), RouterError> {
        let inputs = sub_plan
            .inputs
            .iter()
            .map(|input| DynSolValue::Bytes(input.to_vec()))
            .collect();
        self.add_command(
            CommandType::ExecuteSubPlan,
            &[
                DynSolValue::Bytes(sub_plan.commands.clone()),
                DynSolValue::Array(inputs),
            ],
            true,
        )
    }

    /// The command byte string encoded so far.
    #[must_use]
    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    /// The input blobs encoded so far, one per command byte.
    #[must_use]
    pub fn inputs(&self) -> &[Bytes] {
        &self.inputs
    }

    /// Number of commands in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the plan is still empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finishes the plan, yielding the `(commands, inputs)` pair passed to
    /// the router's `execute` entry point.
    #[must_use]
    pub fn into_parts(self) -> (Bytes, Vec<Bytes>) {
        (self.commands.into(), self.inputs)
    }
}
