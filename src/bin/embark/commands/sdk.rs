//! `embark install-sdk` command

use anyhow::Result;

use embark::util::Status;

use crate::cli::LocatorArgs;
use crate::commands::{locator_label, GlobalOpts};

pub fn execute(args: LocatorArgs, opts: &GlobalOpts) -> Result<()> {
    let bootstrap =
        embark::ops::bootstrap(args.locator.as_deref(), None, opts.update_policy)?;
    let version = bootstrap.sdk_version().to_string();

    opts.shell.status(
        Status::Installing,
        format!("emsdk {version} (for {})", locator_label(&args.locator)),
    );
    let spinner = opts.shell.spinner(format!("installing emsdk {version}"));

    let mut bootstrap = bootstrap;
    let result = bootstrap.install_sdk();
    spinner.finish_and_clear();
    result?;

    opts.shell
        .status(Status::Finished, format!("emsdk {version} is active"));
    Ok(())
}
