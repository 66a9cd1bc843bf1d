//! End-to-end grammar behavior: combinator semantics, backtracking
//! hygiene, flags, and completion through the full command surface.

use command_grammar_core::{
    ArgValue, ArgsCursor, CommandHandler, CommandSource, DispatchError, ExecutionResult,
    ParseContext, QuotedTokenizer, Tokenizer,
};
use command_grammar_engine::{
    AllRemaining, CommandSpec, Element, FirstMatching, FlagSpec, Flags, Literal, Optional,
    Sequence, ValueArg,
};

struct Console;

impl CommandSource for Console {
    fn send_message(&self, _text: &str) {}
}

fn cursor(line: &str) -> ArgsCursor {
    let tokens = QuotedTokenizer::new().tokenize(line, false).unwrap();
    ArgsCursor::new(line, tokens)
}

fn ok_executor(
    _source: &dyn CommandSource,
    _ctx: &ParseContext,
) -> Result<ExecutionResult, DispatchError> {
    Ok(ExecutionResult::success())
}

#[test]
fn test_sequence_final_index_matches_independent_parses() {
    let a: Element = Literal::word("warp").into();
    let b: Element = ValueArg::string("target").into();

    let mut sequential = cursor("warp hub leftover");
    let mut ctx = ParseContext::new();
    a.parse(&Console, &mut sequential, &mut ctx).unwrap();
    b.parse(&Console, &mut sequential, &mut ctx).unwrap();

    let combined: Element = Sequence::new(vec![
        Literal::word("warp").into(),
        ValueArg::string("target").into(),
    ])
    .into();
    let mut through_sequence = cursor("warp hub leftover");
    let mut ctx2 = ParseContext::new();
    combined
        .parse(&Console, &mut through_sequence, &mut ctx2)
        .unwrap();

    assert_eq!(sequential.consumed(), through_sequence.consumed());
}

#[test]
fn test_weak_optional_never_raises_regardless_of_input() {
    let failing = Literal::word("never-present");
    let optional: Element = Optional::weak(failing).into();

    for line in ["", "x", "x y z", "--strange \"quoted token\""] {
        let mut c = cursor(line);
        let mut ctx = ParseContext::new();
        optional.parse(&Console, &mut c, &mut ctx).unwrap();
        assert_eq!(c.consumed(), 0, "cursor advanced on input {line:?}");
    }
}

#[test]
fn test_first_matching_rewinds_between_branches() {
    let alternation: Element = FirstMatching::new(vec![
        Sequence::new(vec![
            Literal::word("a").with_value("which", ArgValue::Str("a".into())).into(),
            ValueArg::int("a_arg").into(),
        ])
        .into(),
        Literal::word("b").with_value("which", ArgValue::Str("b".into())).into(),
    ])
    .into();

    let mut c = cursor("b");
    let mut ctx = ParseContext::new();
    alternation.parse(&Console, &mut c, &mut ctx).unwrap();

    assert_eq!(
        ctx.require_single("which").unwrap().as_str(),
        Some("b"),
        "second branch must win"
    );
    assert!(!ctx.contains("a_arg"), "first branch leaked partial state");
    assert_eq!(c.consumed(), 1);
}

#[test]
fn test_strong_optional_masks_error_when_trailing_tokens_exist() {
    // The documented quirk: a genuine mistake in the optional argument is
    // skipped because unrelated input follows it.
    let grammar: Element = Sequence::new(vec![
        Optional::strong(ValueArg::int("amount")).into(),
        AllRemaining::new(ValueArg::string("rest")).into(),
    ])
    .into();

    let mut c = cursor("fivee trailing words");
    let mut ctx = ParseContext::new();
    grammar.parse(&Console, &mut c, &mut ctx).unwrap();
    assert!(!ctx.contains("amount"));
    assert_eq!(ctx.get_all("rest").len(), 3);
}

#[test]
fn test_flags_strip_tokens_before_positional_parse() {
    let grammar: Element = Flags::new(AllRemaining::new(ValueArg::string("rest")))
        .flag(FlagSpec::switch("verbose"))
        .flag(FlagSpec::valued("x", ValueArg::string("x")).with_long(None).with_short('x'))
        .into();

    let mut c = cursor("--verbose -x foo");
    let mut ctx = ParseContext::new();
    grammar.parse(&Console, &mut c, &mut ctx).unwrap();

    assert_eq!(ctx.get_all("verbose"), [ArgValue::Bool(true)]);
    assert_eq!(ctx.get_all("x"), [ArgValue::Str("foo".into())]);
    assert!(
        !ctx.contains("rest"),
        "the wrapped positional element must see an empty stream"
    );
}

#[test]
fn test_repeated_through_command_spec() {
    let spec = CommandSpec::new(
        Sequence::new(vec![
            Literal::word("fill").into(),
            command_grammar_engine::Repeated::new(ValueArg::int("corner"), 6).into(),
        ]),
        ok_executor,
    );
    let ctx = spec.parse_line(&Console, "fill 0 64 0 15 80 15").unwrap();
    assert_eq!(ctx.get_all("corner").len(), 6);

    let err = spec.parse_line(&Console, "fill 0 64 0").unwrap_err();
    assert!(err.message().contains("missing argument"));
}

#[test]
fn test_completion_walks_the_grammar() {
    let spec = CommandSpec::new(
        Sequence::new(vec![
            Literal::word("give").into(),
            ValueArg::string("player")
                .with_suggestions(|_| vec!["alice".into(), "bob".into()])
                .into(),
            ValueArg::int("amount").into(),
        ]),
        ok_executor,
    );

    assert_eq!(spec.suggest(&Console, ""), vec!["give"]);
    assert_eq!(spec.suggest(&Console, "g"), vec!["give"]);
    assert_eq!(spec.suggest(&Console, "give "), vec!["alice", "bob"]);
    assert_eq!(spec.suggest(&Console, "give b"), vec!["bob"]);
    // No trailing space: the player argument is still being typed.
    assert_eq!(spec.suggest(&Console, "give bob"), vec!["bob"]);
    assert!(spec.suggest(&Console, "give bob 4").is_empty());
}

#[test]
fn test_completion_survives_malformed_input() {
    let spec = CommandSpec::new(
        Sequence::new(vec![
            Literal::word("say").into(),
            ValueArg::string("message").into(),
        ]),
        ok_executor,
    );
    // A half-typed quote must not make suggestions fail.
    assert!(spec.suggest(&Console, "say \"unfinished").is_empty());
}

#[test]
fn test_flags_completion_through_command_spec() {
    let spec = CommandSpec::new(
        Flags::new(ValueArg::string("player").with_suggestions(|_| vec!["alice".into()]))
            .flag(FlagSpec::switch("silent").with_short('s'))
            .flag(FlagSpec::valued(
                "world",
                ValueArg::string("world").with_suggestions(|_| vec!["overworld".into()]),
            )),
        ok_executor,
    );

    assert_eq!(spec.suggest(&Console, "--si"), vec!["--silent"]);
    assert_eq!(spec.suggest(&Console, "--world over"), vec!["overworld"]);
    assert_eq!(spec.suggest(&Console, "--silent al"), vec!["alice"]);
    // A half-typed positional is never mistaken for a flag name: only the
    // positional's candidates apply.
    assert_eq!(spec.suggest(&Console, "--silent alice"), vec!["alice"]);
}

#[test]
fn test_literal_binds_value_through_alternation() {
    let grammar: Element = FirstMatching::new(vec![
        Literal::word("enable").with_value("state", ArgValue::Bool(true)).into(),
        Literal::word("disable").with_value("state", ArgValue::Bool(false)).into(),
    ])
    .into();

    let mut c = cursor("DISABLE");
    let mut ctx = ParseContext::new();
    grammar.parse(&Console, &mut c, &mut ctx).unwrap();
    assert_eq!(ctx.require_single("state").unwrap(), &ArgValue::Bool(false));
}
