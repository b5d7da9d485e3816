//! End-to-end pipeline tests — realistic scores through parse, validation,
//! and expansion, plus the failure modes a host sees.

use std::fs;
use std::io::Write;

use ramify::event::{Event, Ticks};
use ramify::expand::{Limits, PerfState, ScriptedDraws};
use ramify::grammar::{CompileOptions, Compiler, ErrorKind};
use ramify::pitch::Letter;

/// A small but representative piece: chords, controls, nested operators,
/// references, and a drum-like ostinato.
fn sample_piece() -> &'static str {
    "\
// two-phrase demo piece
start piece
piece = ::i=piano ::v=70 intro [x2][phrase] outro
intro = [>>2][:3c :3g :c]
phrase = melody [T-12][bassline]
melody = [x2][{:c :e | :g :e}]
bassline = :2c<2> :2g<2>
outro = Cmaj
Cmaj = :c :e :g
"
}

#[test]
fn sample_piece_compiles() {
    let events = Compiler::compile(sample_piece(), &CompileOptions::default()).unwrap();
    assert!(!events.is_empty());

    // Sorted by onset throughout.
    for pair in events.windows(2) {
        assert!(pair[0].onset <= pair[1].onset);
    }

    // Controls ran before the first note.
    assert!(events.iter().all(|e| e.instrument == "piano"));
    assert!(events.iter().all(|e| e.velocity == 70));

    // The final chord carries three pitches.
    let last = events.last().unwrap();
    assert_eq!(last.pitches.len(), 3);
}

#[test]
fn sample_piece_structure_is_deterministic() {
    let a = Compiler::compile(sample_piece(), &CompileOptions::default()).unwrap();
    let b = Compiler::compile(sample_piece(), &CompileOptions::default()).unwrap();
    assert_eq!(a, b);

    // intro: three notes at half duration; first melody note follows at 3/2.
    assert_eq!(a[0].onset, Ticks::zero());
    assert_eq!(a[0].duration, Ticks::new(1, 2));
    assert_eq!(a[3].onset, Ticks::new(3, 2));
}

#[test]
fn bassline_transposes_down_an_octave() {
    let events = Compiler::compile(sample_piece(), &CompileOptions::default()).unwrap();
    // bassline notes are written at octave 2 and transposed down 12.
    assert!(events
        .iter()
        .any(|e| !e.pitches.is_empty() && e.pitches[0].octave == 1));
}

#[test]
fn start_override_compiles_a_sub_pattern() {
    let options = CompileOptions {
        start: Some("Cmaj".to_string()),
        ..CompileOptions::default()
    };
    let events = Compiler::compile(sample_piece(), &options).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pitches.len(), 3);
    // Start-symbol expansion uses the caller's initial state, not the
    // piece's controls.
    assert_eq!(events[0].instrument, "sine");
}

#[test]
fn initial_state_defaults_and_overrides() {
    let source = "start S\nS = :c";
    let events = Compiler::compile(source, &CompileOptions::default()).unwrap();
    assert_eq!(events[0].instrument, "sine");
    assert_eq!(events[0].velocity, 50);

    let options = CompileOptions {
        initial: PerfState {
            instrument: "strings".to_string(),
            velocity: 110,
        },
        ..CompileOptions::default()
    };
    let events = Compiler::compile(source, &options).unwrap();
    assert_eq!(events[0].instrument, "strings");
    assert_eq!(events[0].velocity, 110);
}

#[test]
fn source_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(sample_piece().as_bytes()).unwrap();

    let source = fs::read_to_string(file.path()).unwrap();
    let events = Compiler::compile(&source, &CompileOptions::default()).unwrap();
    assert_eq!(
        events,
        Compiler::compile(sample_piece(), &CompileOptions::default()).unwrap()
    );
}

#[test]
fn events_round_trip_through_json() {
    let events = Compiler::compile(sample_piece(), &CompileOptions::default()).unwrap();
    let json = serde_json::to_string(&events).unwrap();
    let back: Vec<Event> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, events);
}

#[test]
fn rest_events_are_part_of_the_stream() {
    let events = Compiler::compile("start S\nS = :_<2> :c", &CompileOptions::default()).unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0].is_rest());
    assert_eq!(events[0].duration, Ticks::from_int(2));
    assert_eq!(events[1].onset, Ticks::from_int(2));
}

#[test]
fn empty_alternative_expands_to_silence() {
    let mut rng = ScriptedDraws::new(vec![1]);
    let events =
        Compiler::compile_with("start S\nS = {:c|}", &CompileOptions::default(), &mut rng)
            .unwrap();
    assert!(events.is_empty());
}

#[test]
fn fractional_mult_and_scale_compose_exactly() {
    let events =
        Compiler::compile("start S\nS = [>>2][:c<3/2> :d]", &CompileOptions::default()).unwrap();
    assert_eq!(events[0].duration, Ticks::new(3, 4));
    assert_eq!(events[1].onset, Ticks::new(3, 4));
    assert_eq!(events[1].duration, Ticks::new(1, 2));
}

#[test]
fn last_definition_wins() {
    let source = "start S\nS = :c\nS = :d :_";
    let events = Compiler::compile(source, &CompileOptions::default()).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].pitches[0].letter, Letter::D);
}

// =============================================================================
// Failure modes and exit codes
// =============================================================================

#[test]
fn parse_failure_exits_one() {
    let err = Compiler::compile("start S\nS = [x2][:c", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(err.exit_code(), 1);
    assert!(err.line > 0);
}

#[test]
fn lex_failure_exits_one() {
    let err = Compiler::compile("start S\nS = :c!", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lex);
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn undefined_symbol_exits_two() {
    let err = Compiler::compile("start S\nS = Missing", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedSymbol);
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn cycle_exits_three() {
    let err =
        Compiler::compile("start A\nA = [T2][B]\nB = A", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cycle);
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn guarded_recursion_hits_resource_limit() {
    // `[x2][A]` bounds the static cycle edge but still diverges at run time.
    let err = Compiler::compile("start A\nA = [x2][A]", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ResourceLimit);
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn event_ceiling_hits_resource_limit() {
    let options = CompileOptions {
        limits: Limits {
            max_depth: 128,
            max_events: 64,
        },
        ..CompileOptions::default()
    };
    let err = Compiler::compile("start S\nS = [x1000][:c]", &options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ResourceLimit);
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn no_partial_output_on_failure() {
    // The first 9 notes would expand fine; the tenth underflows. The whole
    // compile fails rather than returning a prefix.
    let source = "start S\nS = [x9][:c] :d<0>";
    let err = Compiler::compile(source, &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DurationUnderflow);
}
