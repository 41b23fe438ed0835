use color_eyre::Result;
use dialoguer::Confirm;

/// Prompt for yes/no with optional default
pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    let mut confirm_builder = Confirm::new().with_prompt(prompt);

    if let Some(default_value) = default {
        confirm_builder = confirm_builder.default(default_value);
    }

    confirm_builder
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Ask before a destructive change unless the caller already confirmed it
pub fn confirm_unless(skip: bool, prompt: &str) -> Result<bool> {
    if skip {
        return Ok(true);
    }
    prompt_yes_no(prompt, Some(false))
}
