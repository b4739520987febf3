//! `firectl status`

use intellifire_core::Coordinator;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    output::print_status(coordinator, global.output, global.verbose > 0)
}
