use crate::block::Cfg;
use crate::instr::{BinOp, Instr, IrType, Lit};
use crate::module::{ClassRecord, Function, Module};

#[test]
fn typed_opcodes_carry_suffixes() {
    let cases = [
        (
            Instr::Alloc {
                ty: IrType::Int,
                len: None,
                dest: "%x".into(),
            },
            "alloc_int %x",
        ),
        (
            Instr::Alloc {
                ty: IrType::CharArray,
                len: Some(5),
                dest: "%s".into(),
            },
            "alloc_char[]_5 %s",
        ),
        (
            Instr::Store {
                ty: IrType::Int,
                len: None,
                src: "%1".into(),
                dest: "%x".into(),
            },
            "store_int %1 %x",
        ),
        (
            Instr::Literal {
                ty: IrType::Char,
                value: Lit::Char('\n'),
                dest: "%2".into(),
            },
            "literal_char '\\n' %2",
        ),
        (
            Instr::Binary {
                op: BinOp::Add,
                left: "%1".into(),
                right: "%2".into(),
                dest: "%3".into(),
            },
            "add_int %1 %2 %3",
        ),
        (
            Instr::CBranch {
                cond: "%3".into(),
                then_to: "if.then".into(),
                else_to: "if.end".into(),
            },
            "cbranch %3 %if.then %if.end",
        ),
        (
            Instr::NewObject {
                class: "B".into(),
                dest: "%b".into(),
            },
            "new_@B %b",
        ),
        (
            Instr::StoreElem {
                ty: IrType::Int,
                src: "%1".into(),
                arr: "%a".into(),
                idx: "%2".into(),
            },
            "store_int_array %1 %a %2",
        ),
    ];
    for (instr, expected) in cases {
        assert_eq!(instr.to_string(), expected);
    }
}

#[test]
fn records_and_globals() {
    let class = Instr::Class {
        name: "@B".into(),
        superclass: Some("A".into()),
    };
    assert_eq!(class.to_string(), "class @B A");

    let field = Instr::Field {
        ty: IrType::Int,
        name: "@A.n".into(),
        init: Some(Lit::Int(7)),
    };
    assert_eq!(field.to_string(), "field_int @A.n 7");

    let s = Instr::GlobalString {
        name: "@.str.0".into(),
        value: "hi\n".into(),
    };
    assert_eq!(s.to_string(), "global_String @.str.0 \"hi\\n\"");

    let arr = Instr::GlobalArray {
        ty: IrType::IntArray,
        len: 3,
        name: "@.const_a.0".into(),
        values: vec![Lit::Int(1), Lit::Int(2), Lit::Int(3)],
    };
    assert_eq!(arr.to_string(), "global_int[]_3 @.const_a.0 [1, 2, 3]");
}

#[test]
fn define_lists_typed_params() {
    let define = Instr::Define {
        ret: IrType::Int,
        name: "@A.sum".into(),
        params: vec![(IrType::Int, "%1".into()), (IrType::Int, "%2".into())],
    };
    assert_eq!(define.to_string(), "define_int @A.sum (int %1, int %2)");

    let main = Instr::Define {
        ret: IrType::Void,
        name: "@Main.main".into(),
        params: vec![(IrType::StrArray, "%args".into())],
    };
    assert_eq!(main.to_string(), "define_void @Main.main (String[] %args)");
}

#[test]
fn module_dump_orders_sections() {
    let mut cfg = Cfg::new();
    let entry = cfg.add_block("entry");
    cfg.block_mut(entry).push(Instr::Print {
        ty: IrType::Str,
        src: "@.str.0".into(),
    });
    cfg.block_mut(entry).push(Instr::Jump {
        target: "exit".into(),
    });
    let exit = cfg.add_block("exit");
    cfg.block_mut(exit).push(Instr::ReturnVoid);

    let module = Module {
        text: vec![Instr::GlobalString {
            name: "@.str.0".into(),
            value: "hi".into(),
        }],
        classes: vec![ClassRecord {
            decl: Instr::Class {
                name: "@Main".into(),
                superclass: None,
            },
            fields: vec![],
        }],
        functions: vec![Function {
            name: "@Main.main".into(),
            define: Instr::Define {
                ret: IrType::Void,
                name: "@Main.main".into(),
                params: vec![(IrType::StrArray, "%args".into())],
            },
            cfg,
        }],
    };

    insta::assert_snapshot!(module.to_string(), @r#"
    global_String @.str.0 "hi"

    class @Main

    define_void @Main.main (String[] %args)
    entry:
      print_String @.str.0
      jump %exit
    exit:
      return_void
    "#);

    assert_eq!(module.instr_count(), module.flatten().len());
    assert_eq!(module.instr_count(), 8);
}
