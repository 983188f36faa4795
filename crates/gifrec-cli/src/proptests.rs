//! Property-based tests for gifrec-cli
//!
//! These tests verify configuration layering and input handling using proptest.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::config::{CliOverrides, Config, ENV_FPS, ENV_MAX_WIDTH};
    use crate::frames::frame_timestamp_ms;
    use crate::output::{OutputFormat, Reporter};
    use crate::ExitCode;

    // Override precedence
    //
    // A flag that is given always wins; a flag that is absent leaves the
    // environment or file value in place.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_flags_beat_environment(
            env_fps in 1u32..=1000,
            env_width in 0u32..4000,
            flag_fps in proptest::option::of(1u32..=1000),
            flag_width in proptest::option::of(0u32..4000)
        ) {
            let env_fps_s = env_fps.to_string();
            let env_width_s = env_width.to_string();
            let config = Config::default()
                .with_env_from(|key| match key {
                    ENV_FPS => Some(env_fps_s.clone()),
                    ENV_MAX_WIDTH => Some(env_width_s.clone()),
                    _ => None,
                })
                .unwrap()
                .with_overrides(&CliOverrides {
                    fps: flag_fps,
                    max_width: flag_width,
                    ..CliOverrides::default()
                });

            prop_assert_eq!(config.conversion.fps, flag_fps.unwrap_or(env_fps));
            prop_assert_eq!(config.conversion.max_width, flag_width.unwrap_or(env_width));
            prop_assert!(config.validate().is_ok());
        }
    }

    // Synthesized timestamps
    //
    // Frame timestamps start at 0 and grow by exactly floor(1000 / fps).
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_timestamps_evenly_spaced(fps in 1u32..=1000, index in 0usize..10_000) {
            let step = (1000 / fps) as u64;
            prop_assert_eq!(frame_timestamp_ms(0, fps), 0);
            prop_assert_eq!(
                frame_timestamp_ms(index + 1, fps) - frame_timestamp_ms(index, fps),
                step
            );
        }
    }

    // JSON errors
    //
    // Every error rendered in JSON mode is valid JSON carrying the exit code name.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_json_errors_are_valid(message in ".*", code_index in 0usize..5) {
            let codes = [
                ExitCode::Success,
                ExitCode::GeneralError,
                ExitCode::InvalidInput,
                ExitCode::NoFramesProcessable,
                ExitCode::IoError,
            ];
            let code = codes[code_index];
            let reporter = Reporter::new(OutputFormat::Json, false);
            let output = reporter.render_failure("convert", &message, code).unwrap();

            let value: serde_json::Value = serde_json::from_str(&output).unwrap();
            prop_assert_eq!(value["error"]["message"].as_str(), Some(message.as_str()));
            prop_assert_eq!(value["error"]["code"].as_str(), Some(code.name()));
            prop_assert_eq!(value["error"]["status"].as_i64(), Some(i32::from(code) as i64));
        }
    }
}
