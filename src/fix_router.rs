use crate::{
    config::{Config, Overrides},
    decoder::decode,
    error::FixError,
    extractor::{extract_suggestion, FixSuggestion},
    llm_generator::TextGenerator,
    prompt::build_prompt,
    reporter::{report, Report},
    request::{FixRequest, GenerationParams, DEFAULT_SHELL},
};
use tracing::{debug, info};

/// Raw inputs of a fix request as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct FixInputs {
    pub shell: Option<String>,
    pub cmd_b64: Option<String>,
    pub err_b64: Option<String>,
    pub overrides: Overrides,
}

/// Runs one fix request end to end: decode, build the prompt, call the
/// generator once, extract, report.
pub struct FixRouter {
    config: Config,
}

impl FixRouter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Processes a fix request and returns the record to print.
    ///
    /// `make_generator` receives the credential and is only called once every
    /// pre-flight check has passed, so a rejected request never reaches the
    /// generation service.
    pub async fn process<F>(
        &self,
        inputs: FixInputs,
        credential: Option<&str>,
        make_generator: F,
    ) -> Report
    where
        F: FnOnce(&str) -> Box<dyn TextGenerator>,
    {
        let merged = self.config.merged(&inputs.overrides);
        let outcome = self.run(inputs, &merged, credential, make_generator).await;
        report(outcome, merged.auto_confirm)
    }

    async fn run<F>(
        &self,
        inputs: FixInputs,
        merged: &Config,
        credential: Option<&str>,
        make_generator: F,
    ) -> Result<Option<FixSuggestion>, FixError>
    where
        F: FnOnce(&str) -> Box<dyn TextGenerator>,
    {
        let api_key = credential
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(FixError::MissingCredential)?;

        let request = Self::build_request(inputs, merged)?;

        let last_command = decode(&request.last_command_b64).map_err(|source| FixError::Decode {
            field: "--cmd-b64",
            source,
        })?;
        let error_output = decode(&request.error_output_b64).map_err(|source| FixError::Decode {
            field: "--err-b64",
            source,
        })?;

        info!("Processing fix request for shell: {}", request.target_shell);
        let prompt = build_prompt(&request.target_shell, &last_command, &error_output);

        let generator = make_generator(api_key);
        let raw = generator.generate(&prompt, &request.params).await?;

        let suggestion = extract_suggestion(&raw);
        match &suggestion {
            Some(s) if s.has_command() => debug!("Model proposed a command"),
            Some(_) => info!("Model returned no command"),
            None => info!("No structured object in model response"),
        }
        Ok(suggestion)
    }

    fn build_request(inputs: FixInputs, merged: &Config) -> Result<FixRequest, FixError> {
        let last_command_b64 = inputs
            .cmd_b64
            .ok_or_else(|| FixError::InvalidInput("--cmd-b64 is required".to_string()))?;

        let target_shell = inputs
            .shell
            .map(|shell| shell.trim().to_string())
            .filter(|shell| !shell.is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());

        let params = GenerationParams::new(
            &merged.model,
            merged.temperature,
            merged.max_output_tokens,
        )?;

        Ok(FixRequest {
            target_shell,
            last_command_b64,
            error_output_b64: inputs.err_b64.unwrap_or_default(),
            params,
        })
    }
}
