//! The built-in demo command set the binary operates on.

use std::sync::Arc;

use command_grammar_core::{
    ArgValue, CommandSource, DispatchError, ExecutionResult, ParseContext,
};
use command_grammar_engine::{
    AllRemaining, Choice, CommandSpec, Dispatcher, FlagSpec, Flags, Optional, Sequence, SubCommand,
    ValueArg,
};

const OWNER: &str = "demo";

fn players() -> Vec<String> {
    ["alice", "bob", "carol"].iter().map(|s| s.to_string()).collect()
}

fn require_str(ctx: &ParseContext, key: &str) -> Result<String, DispatchError> {
    Ok(ctx
        .require_single(key)
        .map_err(|e| DispatchError::Execution(e.to_string()))?
        .to_string())
}

fn greet_command() -> CommandSpec {
    CommandSpec::new(
        Sequence::new(vec![
            ValueArg::string("name").with_suggestions(|_| players()).into(),
            Optional::strong(ValueArg::int("times"))
                .with_default("times", ArgValue::Int(1))
                .into(),
        ]),
        |source: &dyn CommandSource, ctx: &ParseContext| {
            let name = require_str(ctx, "name")?;
            let times = ctx
                .require_single("times")
                .map_err(|e| DispatchError::Execution(e.to_string()))?
                .as_int()
                .unwrap_or(1);
            for _ in 0..times {
                source.send_message(&format!("Hello, {name}!"));
            }
            Ok(ExecutionResult::success())
        },
    )
    .with_description("Greets a player, optionally several times")
}

fn give_command() -> CommandSpec {
    let positional = Sequence::new(vec![
        ValueArg::string("player").with_suggestions(|_| players()).into(),
        Choice::of(
            "item",
            &[
                ("sword", ArgValue::Str("sword".into())),
                ("shield", ArgValue::Str("shield".into())),
                ("spade", ArgValue::Str("spade".into())),
            ],
        )
        .into(),
        Optional::strong(ValueArg::int("amount"))
            .with_default("amount", ArgValue::Int(1))
            .into(),
    ]);

    CommandSpec::new(
        Flags::new(positional)
            .flag(FlagSpec::switch("silent").with_short('s'))
            .flag(FlagSpec::valued(
                "world",
                ValueArg::string("world")
                    .with_suggestions(|_| vec!["overworld".into(), "nether".into(), "end".into()]),
            )),
        |source: &dyn CommandSource, ctx: &ParseContext| {
            let player = require_str(ctx, "player")?;
            let amount = ctx
                .require_single("amount")
                .map_err(|e| DispatchError::Execution(e.to_string()))?
                .as_int()
                .unwrap_or(1);
            let silent = ctx.contains("silent");
            let mut result = ExecutionResult::default();
            // A prefix-style item match may resolve to several items.
            for item in ctx.get_all("item") {
                if !silent {
                    let world = ctx
                        .get_single("world")
                        .map(|w| format!(" in {w}"))
                        .unwrap_or_default();
                    source.send_message(&format!("Gave {player} {amount} x {item}{world}."));
                }
                result.absorb(ExecutionResult::success());
            }
            Ok(result)
        },
    )
    .with_description("Gives items to a player")
    .with_help("Gives one or more items to a player.\nFlags: --silent suppresses chat output, --world <world> picks the target world.")
}

fn region_command() -> CommandSpec {
    let sub = SubCommand::new("action").fallback(
        |source: &dyn CommandSource, _ctx: &ParseContext| {
            source.send_message("Regions: spawn, market");
            Ok(ExecutionResult::success())
        },
    );

    let define = CommandSpec::new(
        Sequence::new(vec![
            ValueArg::string("name").into(),
            AllRemaining::new(ValueArg::string("owners")).into(),
        ]),
        |source: &dyn CommandSource, ctx: &ParseContext| {
            let name = require_str(ctx, "name")?;
            source.send_message(&format!(
                "Defined region {name} with {} owner(s).",
                ctx.get_all("owners").len()
            ));
            Ok(ExecutionResult::success())
        },
    )
    .with_description("Defines a region");
    sub.register(OWNER, Arc::new(define), &["define", "def"], None)
        .expect("demo aliases are unique");

    let remove = CommandSpec::new(
        ValueArg::string("name"),
        |source: &dyn CommandSource, ctx: &ParseContext| {
            let name = require_str(ctx, "name")?;
            source.send_message(&format!("Removed region {name}."));
            Ok(ExecutionResult::success())
        },
    )
    .with_description("Removes a region");
    sub.register(OWNER, Arc::new(remove), &["remove", "rm"], None)
        .expect("demo aliases are unique");

    let executor = sub.executor();
    CommandSpec::new(sub, executor)
        .with_description("Manages named regions")
        .with_help("region            lists regions\nregion define ...  defines a region\nregion remove ...  removes a region")
}

/// Builds the demo dispatcher the binary's subcommands operate on.
pub fn build() -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(OWNER, Arc::new(greet_command()), &["greet", "hello"], None)
        .expect("demo aliases are unique");
    dispatcher
        .register(OWNER, Arc::new(give_command()), &["give"], None)
        .expect("demo aliases are unique");
    dispatcher
        .register(OWNER, Arc::new(region_command()), &["region", "rg"], None)
        .expect("demo aliases are unique");
    dispatcher
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl CommandSource for Recorder {
        fn send_message(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn test_demo_commands_execute() {
        let dispatcher = build();
        let source = Recorder(Mutex::new(Vec::new()));

        assert!(dispatcher.process(&source, "greet alice 2").unwrap().is_success());
        assert!(dispatcher
            .process(&source, "give bob sword --silent")
            .unwrap()
            .is_success());
        assert!(dispatcher
            .process(&source, "region define spawn alice bob")
            .unwrap()
            .is_success());
        assert!(dispatcher.process(&source, "region").unwrap().is_success());

        let messages = source.0.lock().unwrap();
        assert_eq!(messages[0], "Hello, alice!");
        assert_eq!(messages[1], "Hello, alice!");
        assert_eq!(messages[2], "Defined region spawn with 2 owner(s).");
        assert_eq!(messages[3], "Regions: spawn, market");
    }

    #[test]
    fn test_demo_suggestions() {
        let dispatcher = build();
        let source = Recorder(Mutex::new(Vec::new()));

        assert_eq!(dispatcher.suggest(&source, "gr"), vec!["greet"]);
        assert_eq!(dispatcher.suggest(&source, "greet a"), vec!["alice"]);
        let region = dispatcher.suggest(&source, "region ");
        assert!(region.contains(&"define".to_string()));
        assert!(region.contains(&"remove".to_string()));
    }
}
