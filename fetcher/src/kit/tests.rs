//! Tests for kit command assembly and execution.

use super::*;
use crate::test_utils::{StubExecutor, output};
use rstest::{fixture, rstest};

const KIT: &str = "/opt/kit/kit";

#[fixture]
fn executor() -> StubExecutor {
    StubExecutor::default()
}

fn session<'a>(
    executor: &'a StubExecutor,
    registry: Option<&str>,
    plain_http: bool,
) -> KitSession<'a> {
    let options = RegistryOptions {
        registry: registry.map(str::to_owned),
        plain_http,
    };
    KitSession::new(Utf8PathBuf::from(KIT), options, executor)
}

fn only_call(executor: &StubExecutor) -> Invocation {
    let calls = executor.calls();
    assert_eq!(calls.len(), 1, "expected exactly one invocation: {calls:?}");
    calls.into_iter().next().unwrap_or_default()
}

#[rstest]
fn login_passes_password_on_stdin(executor: StubExecutor) {
    session(&executor, Some("registry.test"), false)
        .login("jozu", "hunter2")
        .expect("login succeeds");

    let call = only_call(&executor);
    assert_eq!(call.program, std::path::PathBuf::from(KIT));
    assert_eq!(
        call.args,
        vec!["login", "-v", "registry.test", "-u", "jozu", "--password-stdin"]
    );
    assert_eq!(call.stdin.as_deref(), Some("hunter2"));
    assert!(!call.args.iter().any(|a| a.contains("hunter2")));
}

#[rstest]
fn login_without_registry_runs_nothing(executor: StubExecutor) {
    let result = session(&executor, None, false).login("jozu", "hunter2");
    assert!(matches!(result, Err(KitError::MissingRegistry)));
    assert!(executor.calls().is_empty());
}

#[rstest]
#[case::without_kitfile(None, vec!["pack", "/work/model", "-t", "registry.test/m:v1"])]
#[case::with_kitfile(
    Some("/work/model/kitfile.yml"),
    vec!["pack", "/work/model", "-t", "registry.test/m:v1", "-f", "/work/model/kitfile.yml"]
)]
fn pack_runs_inside_directory(
    executor: StubExecutor,
    #[case] kitfile: Option<&str>,
    #[case] expected: Vec<&str>,
) {
    let directory = Utf8PathBuf::from("/work/model");
    session(&executor, None, true)
        .pack(&directory, "registry.test/m:v1", kitfile.map(Utf8Path::new))
        .expect("pack succeeds");

    let call = only_call(&executor);
    assert_eq!(call.args, expected);
    assert_eq!(call.current_dir, Some(std::path::PathBuf::from("/work/model")));
}

#[cfg(unix)]
#[test]
fn pack_resolves_relative_paths_before_entering_directory() {
    use crate::kit::executor::SystemCommandExecutor;
    use std::os::unix::fs::PermissionsExt;

    // Created under the test's working directory so every path below is relative.
    let temp = tempfile::tempdir_in(".").expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    assert!(root.is_relative(), "root should be relative: {root}");
    let model = root.join("model");
    std::fs::create_dir_all(&model).expect("create model dir");
    let kitfile = model.join("Kitfile");
    std::fs::write(&kitfile, "manifestVersion: 1.0.0\n").expect("write Kitfile");
    std::fs::create_dir_all(root.join("bin")).expect("create bin dir");
    let binary = root.join("bin").join("kit");
    std::fs::write(
        &binary,
        "#!/bin/sh\n\
         test -d \"$2\" || { echo \"no dir $2\" >&2; exit 1; }\n\
         test -f \"$6\" || { echo \"no kitfile $6\" >&2; exit 1; }\n\
         pwd > packed-from\n",
    )
    .expect("write kit script");
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
        .expect("chmod kit script");

    let executor = SystemCommandExecutor;
    let session = KitSession::new(binary, RegistryOptions::default(), &executor);
    session
        .pack(&model, "registry.test/m:v1", Some(kitfile.as_path()))
        .expect("pack with relative paths");

    assert!(model.join("packed-from").is_file());
}

#[rstest]
#[case::plain_http(true)]
#[case::tls(false)]
fn unpack_appends_filters_then_plain_http(executor: StubExecutor, #[case] plain_http: bool) {
    let destination = Utf8PathBuf::from("/tmp/unpack");
    let filters = vec!["--model".to_owned(), "--kitfile".to_owned()];
    let returned = session(&executor, None, plain_http)
        .unpack("registry.test/m:v1", &destination, &filters)
        .expect("unpack succeeds");
    assert_eq!(returned, destination);

    let mut expected = vec![
        "unpack",
        "registry.test/m:v1",
        "-d",
        "/tmp/unpack",
        "--model",
        "--kitfile",
    ];
    if plain_http {
        expected.push("--plain-http");
    }
    assert_eq!(only_call(&executor).args, expected);
}

#[rstest]
fn unpack_rejects_unknown_filter_before_running(executor: StubExecutor) {
    let filters = vec!["--model".to_owned(), "--weights".to_owned()];
    let result = session(&executor, None, false).unpack(
        "registry.test/m:v1",
        Utf8Path::new("/tmp/unpack"),
        &filters,
    );
    assert!(
        matches!(result, Err(KitError::InvalidFilter { ref filter, .. }) if filter == "--weights"),
        "got {result:?}"
    );
    assert!(executor.calls().is_empty());
}

#[rstest]
#[case::pull("pull", vec!["pull", "registry.test/m:v1", "--plain-http"])]
#[case::push("push", vec!["push", "registry.test/m:v1", "--plain-http"])]
#[case::tag("tag", vec!["tag", "registry.test/m:v1", "registry.test/m:latest", "--plain-http"])]
fn registry_commands_append_plain_http(
    executor: StubExecutor,
    #[case] command: &str,
    #[case] expected: Vec<&str>,
) {
    let session = session(&executor, None, true);
    let result = match command {
        "pull" => session.pull("registry.test/m:v1"),
        "push" => session.push("registry.test/m:v1"),
        _ => session.tag("registry.test/m:v1", "registry.test/m:latest"),
    };
    result.expect("command succeeds");
    assert_eq!(only_call(&executor).args, expected);
}

#[test]
fn non_zero_exit_surfaces_command_failure() {
    let executor = StubExecutor::new(vec![output(1, "  denied: requested access is denied \n")]);
    let result = session(&executor, None, false).push("registry.test/m:v1");
    match result {
        Err(KitError::CommandFailed {
            command, stderr, ..
        }) => {
            assert_eq!(command, "push");
            assert_eq!(stderr, "denied: requested access is denied");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[rstest]
#[case::docs("--docs")]
#[case::code("--code")]
#[case::model("--model")]
#[case::datasets("--datasets")]
#[case::kitfile("--kitfile")]
fn every_documented_filter_is_accepted(#[case] filter: &str) {
    assert!(validate_filters(&[filter.to_owned()]).is_ok());
}
