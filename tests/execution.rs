mod common;

use common::execute;

const FACTORIAL: &str = "{ Sample program
  in TINY language -
  computes factorial
}
read x; { input an integer }
if 0 < x then { don't compute if x <= 0 }
  fact := 1;
  repeat
    fact := fact * x;
    x := x - 1
  until x = 0;
  write fact  { output factorial of x }
end
";

#[test]
fn subtraction_evaluates_left_to_right() {
    assert_eq!(execute("x := 2 - 3 - 4; write x", &[]), vec![-5]);
}

#[test]
fn precedence_and_parentheses() {
    assert_eq!(execute("write 2 + 3 * 4; write (2 + 3) * 4; write 17 / 5", &[]), vec![14, 20, 3]);
}

#[test]
fn factorial() {
    assert_eq!(execute(FACTORIAL, &[5]), vec![120]);
    assert_eq!(execute(FACTORIAL, &[1]), vec![1]);
    assert_eq!(execute(FACTORIAL, &[0]), Vec::<i32>::new());
}

#[test]
fn if_else_picks_one_branch() {
    let src = "read a; if a = 3 then write 1 else write 0 end; write a";
    assert_eq!(execute(src, &[3]), vec![1, 3]);
    assert_eq!(execute(src, &[4]), vec![0, 4]);
}

#[test]
fn nested_loops_count_down() {
    let src = "read n;\nrepeat\n  i := n;\n  repeat write i; i := i - 1 until i < 1;\n  n := n - 1\nuntil n = 0";
    assert_eq!(execute(src, &[2]), vec![2, 1, 1]);
}

#[test]
fn comparisons_yield_one_or_zero_for_branching() {
    let src = "read a; read b; if a < b then write a else write b end";
    assert_eq!(execute(src, &[3, 9]), vec![3]);
    assert_eq!(execute(src, &[9, 3]), vec![3]);
    assert_eq!(execute(src, &[-2, -2]), vec![-2]);
}
