//! `embark clean` command

use anyhow::Result;

use embark::util::Status;

use crate::cli::LocatorArgs;
use crate::commands::{locator_label, GlobalOpts};

pub fn execute(args: LocatorArgs, opts: &GlobalOpts) -> Result<()> {
    let label = locator_label(&args.locator);
    opts.shell.status(Status::Cleaning, &label);

    embark::ops::clean(args.locator.as_deref(), None, opts.update_policy)?;

    opts.shell.status(Status::Finished, "clean target ran");
    Ok(())
}
