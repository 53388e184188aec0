use crate::common::*;
use ast::*;
use pretty_assertions::assert_eq;

fn switch_on(
    subject: Expression,
    build: impl FnOnce(&mut SwitchStatement) -> Result<(), Error>,
) -> anyhow::Result<Statement> {
    let mut switch = SwitchStatement::new(subject);
    build(&mut switch)?;
    Ok(Statement::switch(switch, Location::default()))
}

#[test]
fn test_switch_falls_through() -> anyhow::Result<()> {
    let switch = switch_on(num(2), |switch| {
        switch.add_case(num(1), Location::default());
        switch.add_statement(print_char('1'))?;
        switch.add_case(num(2), Location::default());
        switch.add_statement(print_char('2'))?;
        switch.add_default_case(Location::default())?;
        switch.add_statement(print_char('3'))
    })?;

    let run = run(&void_main(vec![switch]))?;

    assert_eq!(run.output, "23");

    Ok(())
}

#[test]
fn test_default_only_without_match() -> anyhow::Result<()> {
    let mut output = String::new();

    for value in 0..4 {
        // The default case comes first to show that matching does not depend
        // on case order.
        let switch = switch_on(var("x"), |switch| {
            switch.add_default_case(Location::default())?;
            switch.add_statement(print_char('d'))?;
            switch.add_statement(brk())?;
            switch.add_case(num(1), Location::default());
            switch.add_statement(print_char('a'))?;
            switch.add_statement(brk())?;
            switch.add_case(num(2), Location::default());
            switch.add_statement(print_char('b'))
        })?;
        let program = void_main(vec![
            declare("x", SymbolType::INT),
            assign("x", num(value)),
            switch,
            print_char('.'),
        ]);

        output += &run(&program)?.output;
    }

    assert_eq!(output, "d.a.b.d.");

    Ok(())
}

#[test]
fn test_break_leaves_infinite_loop() -> anyhow::Result<()> {
    let program = void_main(vec![while_loop(num(1), vec![brk()]), print_char('D')]);

    let run = run(&program)?;

    assert_eq!(run.output, "D");
    assert_eq!(run.exit, Exit::Normal);

    Ok(())
}

#[test]
fn test_continue_runs_step() -> anyhow::Result<()> {
    let program = void_main(vec![
        declare("sum", SymbolType::INT),
        assign("sum", num(0)),
        count(
            "i",
            0,
            10,
            vec![
                if_else(bin("&", var("i"), num(1)), vec![cont()], vec![]),
                assign("sum", bin("+", var("sum"), var("i"))),
            ],
        ),
        print_int(var("sum")),
    ]);

    let run = run(&program)?;

    assert_eq!(run.output, "20");

    Ok(())
}

#[test]
fn test_break_leaves_innermost_loop_only() -> anyhow::Result<()> {
    let program = void_main(vec![
        declare("pairs", SymbolType::INT),
        assign("pairs", num(0)),
        count(
            "i",
            0,
            3,
            vec![count(
                "j",
                0,
                10,
                vec![
                    if_else(rel(">", var("j"), var("i")), vec![brk()], vec![]),
                    assign("pairs", bin("+", var("pairs"), num(1))),
                ],
            )],
        ),
        print_int(var("pairs")),
    ]);

    let run = run(&program)?;

    // 1 + 2 + 3 inner iterations.
    assert_eq!(run.output, "6");

    Ok(())
}

#[test]
fn test_break_in_switch_stays_in_loop() -> anyhow::Result<()> {
    let body = vec![switch_on(var("i"), |switch| {
        switch.add_case(num(1), Location::default());
        switch.add_statement(brk())?;
        switch.add_default_case(Location::default())?;
        switch.add_statement(print_int(var("i")))
    })?];

    let program = void_main(vec![count("i", 0, 4, body), print_char('!')]);

    let run = run(&program)?;

    assert_eq!(run.output, "023!");

    Ok(())
}

#[test]
fn test_while_with_assignment_in_condition() -> anyhow::Result<()> {
    // while ((n = read_int()) != 0) print_int(n * 2);
    let program = void_main(vec![
        declare("n", SymbolType::INT),
        while_loop(
            rel("!=", assignment("n", call("read_int", vec![])), num(0)),
            vec![print_int(bin("*", var("n"), num(2))), print_char(' ')],
        ),
    ]);

    let run = run_with_input(&program, &[3, -4, 10, 0, 99])?;

    assert_eq!(run.output, "6 -8 20 ");

    Ok(())
}
