//! Command line for a job, derived from the experiment config.

use crate::config::ExperimentConfig;

/// Build `[program_name, flag1, value1, flag2, value2, ...]`.
///
/// Pairs keep the config's insertion order. Nothing is quoted: schedulers
/// receive an argument vector, never a shell string.
pub fn build_command_line(config: &ExperimentConfig) -> Vec<String> {
    let mut cmdline = Vec::with_capacity(1 + 2 * config.arguments.len());
    cmdline.push(config.program_name.clone());
    for (flag, value) in config.arguments.iter() {
        cmdline.push(flag.to_string());
        cmdline.push(value.to_string());
    }
    cmdline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_and_pairs() {
        let config = ExperimentConfig::new("sweep", "python3", "/d", "o")
            .with_arg("--x", 1)
            .with_arg("--y", 2);
        assert_eq!(build_command_line(&config), vec!["python3", "--x", "1", "--y", "2"]);
    }

    #[test]
    fn test_no_arguments() {
        let config = ExperimentConfig::new("sweep", "./model", "/d", "o");
        assert_eq!(build_command_line(&config), vec!["./model"]);
    }

    #[test]
    fn test_length_and_order_for_many_pairs() {
        let mut config = ExperimentConfig::new("sweep", "prog", "/d", "o");
        let flags: Vec<String> = (0..25).rev().map(|i| format!("--p{}", i)).collect();
        for (i, flag) in flags.iter().enumerate() {
            config = config.with_arg(flag.clone(), i);
        }

        let cmdline = build_command_line(&config);
        assert_eq!(cmdline.len(), 1 + 2 * flags.len());
        for (i, flag) in flags.iter().enumerate() {
            assert_eq!(&cmdline[1 + 2 * i], flag);
            assert_eq!(cmdline[2 + 2 * i], i.to_string());
        }
    }

    #[test]
    fn test_values_are_not_quoted() {
        let config = ExperimentConfig::new("sweep", "prog", "/d", "o").with_arg("--label", "two words");
        assert_eq!(build_command_line(&config)[2], "two words");
    }
}
