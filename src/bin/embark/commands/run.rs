//! `embark run` command

use anyhow::Result;

use embark::util::Status;

use crate::cli::RunArgs;
use crate::commands::GlobalOpts;

pub fn execute(args: RunArgs, opts: &GlobalOpts) -> Result<()> {
    opts.shell.status(Status::Running, &args.command);

    embark::ops::run(&args.command, &args.args, opts.update_policy)
}
