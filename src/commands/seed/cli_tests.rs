//! CLI parsing tests for the seed command.

#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use clap::Parser;
    use rstest::rstest;
    use std::path::PathBuf;

    crate::cli_parse_test! {
        test_name: test_seed_core_plus_extension,
        args: ["seed", "-a", "Core.json", "-a", "Sample.json", "-e", "ab12"],
        variant: Seed,
        expect: {
            api_schema: vec![PathBuf::from("Core.json"), PathBuf::from("Sample.json")],
            effective_schema_hash: "ab12",
        },
    }

    crate::cli_rejects_test! {
        test_name: test_seed_requires_api_schema,
        args: ["seed", "--effective-schema-hash", "ab12"],
        mentions: "--api-schema",
    }

    crate::cli_rejects_test! {
        test_name: test_seed_requires_hash,
        args: ["seed", "--api-schema", "Core.json"],
        mentions: "--effective-schema-hash",
    }

    crate::cli_dialect_tests! {
        command: "seed",
        variant: Seed,
        required_args: ["-a", "Core.json", "-e", "ab12"],
    }
}
