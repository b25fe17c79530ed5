//! Show and change the uploader settings.

use anyhow::Result;

use crate::cli::ConfigAction;
use crate::config::{TomlSettingsStore, display_entries, with_setting};
use crate::output::Output;

pub fn run_config(store: &TomlSettingsStore, action: ConfigAction) -> Result<()> {
    let out = Output::new();

    match action {
        ConfigAction::Show => {
            let settings = store.read()?.unwrap_or_default();
            out.header(format!("Settings ({})", store.path().display()));
            for (key, value) in display_entries(&settings)? {
                out.labeled_indent(key, value, 2);
            }
            if !settings.is_configured() {
                out.dim("Uploads stay disabled until the endpoint, bucket and keys are set.");
            }
        }
        ConfigAction::Set { key, value } => {
            let settings = store.read()?.unwrap_or_default();
            let updated = with_setting(&settings, &key, &value)?;
            store.write(&updated)?;
            out.success(format!("Set {key}"));
        }
        ConfigAction::Path => {
            out.print(store.path().display());
        }
    }

    Ok(())
}
