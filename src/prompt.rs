//! Prompt template sent to the generation service.
//!
//! The rules in the template are the whole behavioral contract with the
//! model; changing their wording changes what suggestions look like.

/// Renders the fix prompt for `shell` from the decoded last command and its
/// error output.
///
/// User text is placed inside triple-backtick fences. Fences inside the user
/// text are not escaped.
pub fn build_prompt(shell: &str, last_command: &str, error_output: &str) -> String {
    format!(
        "You are a command-line fixer for {shell}.
Given the user's last command and the error output, return ONLY a compact JSON object:
{{
  \"command\": \"<single line fixed command or empty if none>\",
  \"reason\": \"<short reason>\"
}}
Rules:
- Target shell: {shell}. Do NOT add 'sudo'.
- Keep paths properly quoted for {shell} if needed.
- Prefer minimal fixes (typo, missing flag, right subcommand).
- If the command seems to be correct in linux, suggest the equivalent command for {shell}.
- If not confident, return the most likely command.
- If the command is not recognized as a valid command, suggest installing the missing program in the reason.
- If a parameter of the command is not matched, suggest the correct parameter.
- If the last_command reads like a request for something, suggest the command that achieves the user's goal.
Input:
last_command: ```{last_command}```
error_output: ```{error_output}```
"
    )
}
