//! Session Tests
//!
//! Tests verify:
//! - Tagged responses echo the client tag
//! - Malformed lines answer untagged and never echo bad tags
//! - The auth command updates the flag silently
//! - Status/response flushing rules
//! - Loop termination on EOF, timeout, errors and close requests

mod common;

use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{output_lines, ScriptedStream};
use tagmux::auth::{AuthGate, StaticAuthGate};
use tagmux::commands::Logout;
use tagmux::protocol::COMMAND_NOT_FOUND;
use tagmux::{Router, Session};

// =============================================================================
// Helper Functions
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

fn test_router() -> Arc<Router> {
    let router = Router::new();
    router.register_fn("noop", |_, reply| reply.write_response("OK done"));
    router.register_fn("whoami", |_, reply| {
        let text = format!("OK auth={}", reply.auth());
        reply.write_response(&text);
    });
    router.register_fn("echo", |line, reply| {
        let text = format!("OK {}", line);
        reply.write_response(&text);
    });
    router.register("logout", Logout);
    Arc::new(router)
}

fn alice_gate() -> Arc<dyn AuthGate> {
    Arc::new(StaticAuthGate::new([("alice", "secret")]))
}

/// Run a session over `lines` and return it with everything it wrote
fn run_lines(lines: &[&str]) -> (Session<ScriptedStream>, Vec<String>) {
    let stream = ScriptedStream::lines(lines);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());
    session.run().unwrap();
    let lines = output_lines(&output);
    (session, lines)
}

fn not_found_untagged() -> String {
    format!("* {}", COMMAND_NOT_FOUND)
}

/// Gate that counts how often it is consulted
#[derive(Default)]
struct CountingGate {
    calls: AtomicUsize,
}

impl AuthGate for CountingGate {
    fn authenticate(&self, _username: &str, _password: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        true
    }
}

// =============================================================================
// Tagged Response Tests
// =============================================================================

#[test]
fn test_tagged_round_trip() {
    let (_, lines) = run_lines(&["A01 NOOP"]);
    assert_eq!(lines, vec!["A01 OK done"]);
}

#[test]
fn test_command_name_case_insensitive() {
    let (_, lines) = run_lines(&["a1 noop", "a2 NOOP", "a3 NoOp"]);
    assert_eq!(lines, vec!["a1 OK done", "a2 OK done", "a3 OK done"]);
}

#[test]
fn test_handler_sees_lowercased_command_and_raw_args() {
    let (_, lines) = run_lines(&["T9 ECHO Hello World"]);
    assert_eq!(lines, vec!["T9 OK echo Hello World"]);
}

#[test]
fn test_handler_sees_exact_text_after_tag() {
    let router = Router::new();
    router.register_fn("echo", |line, reply| {
        let text = format!("[{}]", line);
        reply.write_response(&text);
    });

    let stream = ScriptedStream::lines(&["A1 ECHO", "A2 ECHO ", "A3 ECHO  x", "A4 EcHo a  b "]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, Arc::new(router), alice_gate());
    session.run().unwrap();

    assert_eq!(
        output_lines(&output),
        vec!["A1 [echo]", "A2 [echo ]", "A3 [echo  x]", "A4 [echo a  b ]"]
    );
}

#[test]
fn test_unknown_command_is_tagged() {
    let (_, lines) = run_lines(&["A7 FROB"]);
    assert_eq!(lines, vec![format!("A7 {}", COMMAND_NOT_FOUND)]);
}

#[test]
fn test_empty_command_name_is_tagged_not_found() {
    let (_, lines) = run_lines(&["A1 "]);
    assert_eq!(lines, vec![format!("A1 {}", COMMAND_NOT_FOUND)]);
}

// =============================================================================
// Malformed Line Tests
// =============================================================================

#[test]
fn test_invalid_tag_is_never_echoed() {
    let (_, lines) = run_lines(&["BAD!1 NOOP"]);
    assert_eq!(lines, vec![not_found_untagged()]);
    assert!(lines.iter().all(|l| !l.contains("BAD!1")));
}

#[test]
fn test_injection_attempt_in_tag() {
    let (_, lines) = run_lines(&["A1\tOK\tfake NOOP"]);
    assert_eq!(lines, vec![not_found_untagged()]);
}

#[test]
fn test_line_without_separator_continues_session() {
    let (session, lines) = run_lines(&["GARBAGE", "A02 NOOP"]);
    assert_eq!(lines, vec![not_found_untagged(), "A02 OK done".to_string()]);
    assert!(session.is_closed());
}

#[test]
fn test_empty_line_is_untagged_not_found() {
    let (_, lines) = run_lines(&["", "A1 NOOP"]);
    assert_eq!(lines, vec![not_found_untagged(), "A1 OK done".to_string()]);
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[test]
fn test_auth_success_is_silent_and_visible_to_later_commands() {
    let (session, lines) = run_lines(&["A01 whoami", "A02 auth alice secret", "A03 whoami"]);
    assert_eq!(lines, vec!["A01 OK auth=false", "A03 OK auth=true"]);
    assert!(session.is_auth());
}

#[test]
fn test_auth_failure_is_silent() {
    let (session, lines) = run_lines(&["A02 auth alice wrong"]);
    assert!(lines.is_empty());
    assert!(!session.is_auth());
}

#[test]
fn test_failed_reauth_resets_flag() {
    let (session, lines) = run_lines(&[
        "A1 auth alice secret",
        "A2 whoami",
        "A3 auth alice nope",
        "A4 whoami",
    ]);
    assert_eq!(lines, vec!["A2 OK auth=true", "A4 OK auth=false"]);
    assert!(!session.is_auth());
}

#[test]
fn test_auth_keyword_is_case_insensitive() {
    let (session, lines) = run_lines(&["A1 AUTH alice secret"]);
    assert!(lines.is_empty());
    assert!(session.is_auth());
}

#[test]
fn test_auth_never_reaches_router() {
    let router = Router::new();
    router.register_fn("auth", |_, reply| reply.write_response("OK routed"));

    let stream = ScriptedStream::lines(&["A1 auth alice secret"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, Arc::new(router), alice_gate());
    session.run().unwrap();

    assert!(output_lines(&output).is_empty());
    assert!(session.is_auth());
}

#[test]
fn test_incomplete_auth_skips_gate() {
    let gate = Arc::new(CountingGate::default());

    let stream = ScriptedStream::lines(&["A1 auth alice", "A2 auth"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), gate.clone());
    session.run().unwrap();

    assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    assert!(!session.is_auth());
    assert!(output_lines(&output).is_empty());
}

#[test]
fn test_incomplete_auth_resets_flag() {
    let (session, _) = run_lines(&["A1 auth alice secret", "A2 auth alice"]);
    assert!(!session.is_auth());
}

#[test]
fn test_default_gate_denies() {
    let stream = ScriptedStream::lines(&["A1 auth alice secret"]);
    let mut session = Session::new(stream, TIMEOUT);
    session.run().unwrap();
    assert!(!session.is_auth());
}

#[test]
fn test_authenticate_directly() {
    let mut session = Session::new(ScriptedStream::new(""), TIMEOUT);
    session.set_auth_gate(alice_gate());

    assert!(session.authenticate("alice", "secret"));
    assert!(session.is_auth());
    assert!(!session.authenticate("bob", "secret"));
    assert!(!session.is_auth());
}

// =============================================================================
// Reply Flushing Tests
// =============================================================================

#[test]
fn test_status_precedes_response() {
    let router = Router::new();
    router.register_fn("select", |_, reply| {
        reply.write_status("2 EXISTS");
        reply.write_response("OK selected");
    });

    let stream = ScriptedStream::lines(&["S1 SELECT INBOX"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, Arc::new(router), alice_gate());
    session.run().unwrap();

    assert_eq!(output_lines(&output), vec!["* 2 EXISTS", "S1 OK selected"]);
}

#[test]
fn test_each_channel_flushes_as_one_line() {
    let router = Router::new();
    router.register_fn("multi", |_, reply| {
        reply.write_status("first ");
        reply.write_status("second");
        reply.write_response("OK ");
        reply.write_response("all");
    });

    let stream = ScriptedStream::lines(&["M1 multi"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, Arc::new(router), alice_gate());
    session.run().unwrap();

    assert_eq!(output_lines(&output), vec!["* first second", "M1 OK all"]);
}

#[test]
fn test_silent_handler_writes_nothing() {
    let router = Router::new();
    router.register_fn("quiet", |_, _| {});

    let stream = ScriptedStream::lines(&["Q1 quiet", "Q2 quiet"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, Arc::new(router), alice_gate());
    session.run().unwrap();

    assert!(output_lines(&output).is_empty());
}

#[test]
fn test_status_only_handler() {
    let router = Router::new();
    router.register_fn("ping", |_, reply| reply.write_status("PONG"));

    let stream = ScriptedStream::lines(&["P1 ping"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, Arc::new(router), alice_gate());
    session.run().unwrap();

    assert_eq!(output_lines(&output), vec!["* PONG"]);
}

// =============================================================================
// Loop Termination Tests
// =============================================================================

#[test]
fn test_lf_only_input() {
    let stream = ScriptedStream::new("A1 NOOP\nA2 NOOP\n");
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());
    session.run().unwrap();

    assert_eq!(output_lines(&output), vec!["A1 OK done", "A2 OK done"]);
}

#[test]
fn test_partial_final_line_is_dropped() {
    let stream = ScriptedStream::new("A1 NOOP\r\nA2 NOOP");
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());
    session.run().unwrap();

    assert_eq!(output_lines(&output), vec!["A1 OK done"]);
}

#[test]
fn test_close_request_stops_reading() {
    let (session, lines) = run_lines(&["L1 LOGOUT", "L2 NOOP"]);
    assert_eq!(lines, vec!["* BYE logging out", "L1 OK LOGOUT completed"]);
    assert!(session.is_closed());
}

#[test]
fn test_closed_session_does_not_read() {
    let stream = ScriptedStream::lines(&["A1 NOOP"]);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());
    session.close();
    session.run().unwrap();

    assert!(output_lines(&output).is_empty());
}

#[test]
fn test_timeout_ends_session_quietly() {
    let stream = ScriptedStream::lines(&["A1 NOOP"]).with_read_error(ErrorKind::WouldBlock);
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());

    assert!(session.run().is_ok());
    assert!(session.is_closed());
    assert_eq!(output_lines(&output), vec!["A1 OK done"]);
}

#[test]
fn test_read_error_is_returned() {
    let stream = ScriptedStream::new("").with_read_error(ErrorKind::PermissionDenied);
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());

    assert!(session.run().is_err());
    assert!(session.is_closed());
}

#[test]
fn test_write_error_is_fatal() {
    let stream = ScriptedStream::lines(&["A1 NOOP", "A2 NOOP"])
        .with_write_error(ErrorKind::PermissionDenied);
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());

    assert!(session.run().is_err());
    assert!(session.is_closed());
}

#[test]
fn test_broken_pipe_ends_session_quietly() {
    let stream = ScriptedStream::lines(&["A1 NOOP"]).with_write_error(ErrorKind::BrokenPipe);
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());

    assert!(session.run().is_ok());
}

#[test]
fn test_idle_timeout_rearmed_per_read() {
    let stream = ScriptedStream::lines(&["A1 NOOP", "A2 NOOP"]);
    let deadlines = stream.deadlines();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());
    session.run().unwrap();

    // Two lines plus the read that hits EOF, each armed then disarmed
    let expected: Vec<Option<Duration>> = (0..3).flat_map(|_| [Some(TIMEOUT), None]).collect();
    assert_eq!(*deadlines.lock(), expected);
}

#[test]
fn test_process_line_without_reading() {
    let stream = ScriptedStream::new("");
    let output = stream.output();
    let mut session = Session::with_services(stream, TIMEOUT, test_router(), alice_gate());

    session.process_line("Z1 noop").unwrap();
    session.process_line("Z2 auth alice secret").unwrap();
    session.process_line("Z3 whoami").unwrap();

    assert_eq!(output_lines(&output), vec!["Z1 OK done", "Z3 OK auth=true"]);
}
