use jtcall::emit::Instr;
use jtcall::*;

fn gcc(block: &AsmBlock) -> String {
    GccStatement(block).to_string()
}

#[test]
fn consecutive_calls_get_distinct_labels() {
    let mut emitter = Emitter::new(Convention::A0);
    let first = emitter.call(42u32);
    let second = emitter.call(42u32);

    let first = check_call(&first.template::<Gcc>(), Register::A0).unwrap();
    let second = check_call(&second.template::<Gcc>(), Register::A0).unwrap();
    assert_eq!(first.return_label, "ret_0");
    assert_eq!(second.return_label, "ret_1");
    assert_eq!(first.slot, second.slot);
}

#[test]
fn call_sequence_order() {
    for convention in Convention::ALL {
        let mut emitter = Emitter::new(convention);
        let block = emitter.call("0xF0040000");
        let kinds: Vec<&str> = block
            .instrs()
            .map(|instr| match instr {
                Instr::LoadLabel { .. } => "push-label",
                Instr::AddImm { .. } => "adjust-sp",
                Instr::StoreWord { .. } => "store",
                Instr::LoadSlot { .. } => "load-slot",
                Instr::JumpReg { .. } => "branch",
                Instr::MoveIn { .. } | Instr::MoveOut { .. } => "move",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["push-label", "adjust-sp", "store", "load-slot", "branch"]
        );

        // Both dialects read back as the same call
        let scratch = convention.scratch();
        let gcc = check_call(&block.template::<Gcc>(), scratch).unwrap();
        let rust = check_call(&block.template::<Rust>(), scratch).unwrap();
        assert_eq!(gcc.slot, rust.slot);
        assert_eq!(gcc.return_label, "ret_0");
        assert_eq!(rust.return_label, "0");
    }
}

#[test]
fn conventions_differ_only_by_scratch() {
    let a0 = gcc(&Emitter::new(Convention::A0).call(0xF0049000u32));
    let t6 = gcc(&Emitter::new(Convention::T6).call(0xF0049000u32));
    assert_ne!(a0, t6);
    assert_eq!(a0.replace("a0", "t6"), t6);
    assert_eq!(
        CallHeader::new(Convention::A0)
            .to_string()
            .replace("a0", "t6"),
        CallHeader::new(Convention::T6).to_string()
    );
}

#[test]
fn parameter_and_ret() {
    let emitter = Emitter::new(Convention::T6);

    let block = emitter.parameter(12, "color").unwrap();
    assert_eq!(gcc(&block), r#"asm("mv x12,%0" :: "r" (color) : "x12");"#);
    assert_eq!(block.defs(), vec![Register::new(12).unwrap()]);
    assert!(block.uses().is_empty());

    let block = emitter.ret(0, "result_0").unwrap();
    assert_eq!(gcc(&block), r#"asm("mv %0,x0" : "=r" (result_0) :: "x0");"#);
    assert!(block.defs().is_empty());
    assert_eq!(block.uses(), vec![Register::ZERO]);

    // Neither touches the label counter
    let mut emitter = emitter;
    let call = emitter.call(1u32);
    assert_eq!(call.labels().next(), Some(Label::new(0)));
}

#[test]
fn labels_continue_from_generator() {
    let mut emitter = Emitter::with_labels(Convention::A0, LabelGenerator::starting_at(7));
    let block = emitter.call("SLOT");
    assert_eq!(
        block.template::<Gcc>(),
        vec![
            "li a0,ret_7",
            "addi sp,sp,-4",
            "sw a0,0(sp)",
            "li a0,[SLOT]",
            "jr a0",
            "ret_7:",
        ]
    );
}

#[test]
fn fox32_wrapper_text() {
    let header = fox32::bindings().unwrap();
    let text = header.to_string();

    assert!(text.contains(
        "static inline void fill_background(
    unsigned int color
) {
    parameter(0, color);
    call(0xF0042000);
}
"
    ));
    assert!(text.contains(
        "static inline void get_os_version(void) {\n    call(0x00000810);\n}\n"
    ));
    assert!(text.contains("// fox32os definitions\n\n// system jump table\n\n"));

    // The wrapper body matches what its statements expand to
    let expanded = header.expand(Convention::A0).unwrap();
    let (name, blocks) = &expanded
        .iter()
        .find(|(name, _)| *name == "random_range")
        .unwrap();
    assert_eq!(*name, "random_range");
    let statements: Vec<String> = blocks.iter().map(gcc).collect();
    assert_eq!(statements.len(), 4);
    assert_eq!(
        statements[0],
        r#"asm("mv x1,%0" :: "r" (minimum) : "x1");"#
    );
    assert!(statements[2].contains(r#""li a0,[0xF0049004]\n""#));
    assert_eq!(
        statements[3],
        r#"asm("mv %0,x0" : "=r" (result_0) :: "x0");"#
    );
}
