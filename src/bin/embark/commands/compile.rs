//! `embark compile` command

use anyhow::Result;

use embark::util::Status;

use crate::cli::LocatorArgs;
use crate::commands::{locator_label, GlobalOpts};

pub fn execute(args: LocatorArgs, opts: &GlobalOpts) -> Result<()> {
    let label = locator_label(&args.locator);
    opts.shell.status(Status::Building, &label);

    let bootstrap = embark::ops::compile(args.locator.as_deref(), None, opts.update_policy)?;

    opts.shell.status(
        Status::Finished,
        format!("compiled {} project", bootstrap.toolchain()),
    );
    Ok(())
}
