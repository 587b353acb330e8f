use crate::errors::FixcheckError;

/// Tool commands are spawned directly, never through a shell.
const DANGEROUS_PATTERNS: &[&str] = &[
    ";",
    "|",
    "&",
    "`",
    "$(",
    ">",
    "<",
    "\n",
];

pub fn validate_security_patterns(value: &serde_yaml::Value) -> Result<(), FixcheckError> {
    if let Some(tools) = value.get("tools") {
        check_value(tools, &["tools".to_string()])?;
    }
    Ok(())
}

fn check_value(value: &serde_yaml::Value, path: &[String]) -> Result<(), FixcheckError> {
    match value {
        serde_yaml::Value::String(s) => {
            for pattern in DANGEROUS_PATTERNS {
                if s.contains(pattern) {
                    let path_str = path.join(".");
                    return Err(FixcheckError::Config(
                        format!("Shell metacharacter '{}' found at config path: {}", pattern.escape_default(), path_str)
                    ));
                }
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = k.as_str().unwrap_or("unknown").to_string();
                let mut new_path = path.to_vec();
                new_path.push(key);
                check_value(v, &new_path)?;
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let mut new_path = path.to_vec();
                new_path.push(format!("[{}]", i));
                check_value(v, &new_path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_tools_pass() {
        let yaml = serde_yaml::from_str::<serde_yaml::Value>(
            "tools:\n  python: /usr/bin/python3\n  scanner: [trivy, fs, --scanners, vuln]"
        ).unwrap();
        assert!(validate_security_patterns(&yaml).is_ok());
    }

    #[test]
    fn test_command_chaining_blocked() {
        let yaml = serde_yaml::from_str::<serde_yaml::Value>(
            "tools:\n  npm: 'npm; rm -rf /'"
        ).unwrap();
        assert!(validate_security_patterns(&yaml).is_err());
    }

    #[test]
    fn test_substitution_in_scanner_args_blocked() {
        let yaml = serde_yaml::from_str::<serde_yaml::Value>(
            "tools:\n  scanner:\n    - trivy\n    - '$(curl evil)'"
        ).unwrap();
        let err = validate_security_patterns(&yaml).unwrap_err();
        assert!(err.to_string().contains("tools.scanner.[1]"));
    }

    #[test]
    fn test_other_sections_not_checked() {
        let yaml = serde_yaml::from_str::<serde_yaml::Value>(
            "sandbox:\n  root: ../scratch\npublish:\n  directory: ./out"
        ).unwrap();
        assert!(validate_security_patterns(&yaml).is_ok());
    }

    #[test]
    fn test_numeric_values_pass() {
        let yaml = serde_yaml::from_str::<serde_yaml::Value>(
            "limits:\n  install_timeout_secs: 300"
        ).unwrap();
        assert!(validate_security_patterns(&yaml).is_ok());
    }
}
