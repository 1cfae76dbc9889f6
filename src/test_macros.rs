//! Declarative macros for CLI parsing tests.
//!
//! Every subcommand shares the same shapes: a few file/name arguments, an
//! optional `--dialect`, and the global `--config`/`--format` flags. The
//! macros below turn one argv line into one test.

/// Parse `args` (subcommand first) and compare fields of the parsed
/// subcommand.
///
/// ```ignore
/// cli_parse_test! {
///     test_name: test_ddl_defaults,
///     args: ["ddl", "-a", "ApiSchema.json"],
///     variant: Ddl,
///     expect: { resources: Vec::<String>::new(), dialect: None },
/// }
/// ```
#[macro_export]
macro_rules! cli_parse_test {
    (
        test_name: $test_name:ident,
        args: [$($arg:expr),+ $(,)?],
        variant: $variant:ident,
        expect: { $($field:ident : $expected:expr),+ $(,)? } $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let args = Args::try_parse_from(["relational_model", $($arg),+])
                .unwrap_or_else(|e| panic!("failed to parse: {}", e));
            let crate::commands::Command::$variant(cmd) = args.command else {
                panic!(concat!("expected the ", stringify!($variant), " command"));
            };
            $(
                assert_eq!(cmd.$field, $expected, concat!("field `", stringify!($field), "`"));
            )+
        }
    };
}

/// Assert that `args` fail to parse. With `mentions`, the clap error must
/// name that text (usually the missing flag).
#[macro_export]
macro_rules! cli_rejects_test {
    (
        test_name: $test_name:ident,
        args: [$($arg:expr),+ $(,)?]
        $(, mentions: $mention:expr)? $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let result = Args::try_parse_from(["relational_model", $($arg),+]);
            let Err(err) = result else {
                panic!("expected a parse error");
            };
            $(
                assert!(
                    err.to_string().contains($mention),
                    "error should mention {}: {}",
                    $mention,
                    err
                );
            )?
            let _ = err;
        }
    };
}

/// Generate the dialect-flag tests for a subcommand that takes
/// `-d/--dialect`: every value and alias resolves, unknown names fail, and
/// omitting the flag leaves the choice to the config file.
#[macro_export]
macro_rules! cli_dialect_tests {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        required_args: [$($req:expr),* $(,)?] $(,)?
    ) => {
        #[rstest]
        #[case(&["--dialect", "pgsql"], Some(crate::sql::SqlDialectKind::Pgsql))]
        #[case(&["-d", "mssql"], Some(crate::sql::SqlDialectKind::Mssql))]
        #[case(&[], None)]
        fn test_dialect_flag(
            #[case] flag: &[&str],
            #[case] expected: Option<crate::sql::SqlDialectKind>,
        ) {
            let mut argv = vec!["relational_model", $cmd $(, $req)*];
            argv.extend_from_slice(flag);
            let args = Args::try_parse_from(argv).unwrap_or_else(|e| panic!("failed to parse: {}", e));
            let crate::commands::Command::$variant(cmd) = args.command else {
                panic!(concat!("expected the ", stringify!($variant), " command"));
            };
            assert_eq!(cmd.dialect, expected);
        }

        #[rstest]
        fn test_dialect_rejects_unknown_name() {
            let argv = vec!["relational_model", $cmd $(, $req)*, "--dialect", "oracle"];
            let err = Args::try_parse_from(argv).unwrap_err();
            assert!(err.to_string().contains("oracle"));
        }
    };
}
