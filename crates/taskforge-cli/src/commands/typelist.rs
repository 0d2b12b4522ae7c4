//! Implementation of the `taskforge typelist` command.
//!
//! Prints a typekit's typelist in the same format it is read from, so the
//! output can be fed back to the importer.

use std::collections::BTreeSet;

use serde_json::json;
use tracing::instrument;

use taskforge_core::domain::{TypeName, Typelist};

use crate::{cli::TypelistArgs, config::AppConfig, error::CliResult, output::OutputManager};

#[instrument(skip_all, fields(typekit = %args.typekit))]
pub fn execute(args: TypelistArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let search = super::search_paths(&args.search, &config);
    let typekit = super::importer(&search).require(&args.typekit)?;
    let typelist = typekit.typelist();

    if output.is_json() {
        output.json(&json!({
            "typekit": typekit.name(),
            "interface": names(&typelist.interface),
            "internal": typelist.internal().map(TypeName::as_str).collect::<Vec<_>>(),
            "all": names(&typelist.all),
        }))?;
        return Ok(());
    }

    let text = render(typelist, args.interface_only);
    for line in text.lines() {
        output.data(line)?;
    }
    Ok(())
}

fn names(set: &BTreeSet<TypeName>) -> Vec<&str> {
    set.iter().map(TypeName::as_str).collect()
}

fn render(typelist: &Typelist, interface_only: bool) -> String {
    if interface_only {
        Typelist {
            all: typelist.interface.clone(),
            interface: typelist.interface.clone(),
        }
        .to_text()
    } else {
        typelist.to_text()
    }
}
