//! Builds small expression trees inside a pool, the way an IR builder would.
//!
//! Every node lives in the attached pool. When the guard goes out of scope
//! all nodes have been freed and the pool is empty again.

use tlpool::{AttachGuard, Pool, PoolBox, PoolConfig};

enum Expr<'g> {
    Const(i64),
    Var(&'static str),
    Add(PoolBox<'g, Expr<'g>>, PoolBox<'g, Expr<'g>>),
    Mul(PoolBox<'g, Expr<'g>>, PoolBox<'g, Expr<'g>>),
    Neg(PoolBox<'g, Expr<'g>>),
}

struct Builder<'g> {
    guard: &'g AttachGuard<'g>,
}

impl<'g> Builder<'g> {
    fn konst(&self, value: i64) -> PoolBox<'g, Expr<'g>> {
        self.guard.alloc_box(Expr::Const(value))
    }

    fn var(&self, name: &'static str) -> PoolBox<'g, Expr<'g>> {
        self.guard.alloc_box(Expr::Var(name))
    }

    fn add(&self, lhs: PoolBox<'g, Expr<'g>>, rhs: PoolBox<'g, Expr<'g>>) -> PoolBox<'g, Expr<'g>> {
        self.guard.alloc_box(Expr::Add(lhs, rhs))
    }

    fn mul(&self, lhs: PoolBox<'g, Expr<'g>>, rhs: PoolBox<'g, Expr<'g>>) -> PoolBox<'g, Expr<'g>> {
        self.guard.alloc_box(Expr::Mul(lhs, rhs))
    }

    fn neg(&self, inner: PoolBox<'g, Expr<'g>>) -> PoolBox<'g, Expr<'g>> {
        self.guard.alloc_box(Expr::Neg(inner))
    }
}

fn eval(expr: &Expr<'_>, x: i64) -> i64 {
    match expr {
        Expr::Const(v) => *v,
        Expr::Var(_) => x,
        Expr::Add(a, b) => eval(a, x) + eval(b, x),
        Expr::Mul(a, b) => eval(a, x) * eval(b, x),
        Expr::Neg(a) => -eval(a, x),
    }
}

fn render(expr: &Expr<'_>) -> String {
    match expr {
        Expr::Const(v) => v.to_string(),
        Expr::Var(name) => (*name).to_string(),
        Expr::Add(a, b) => format!("({} + {})", render(a), render(b)),
        Expr::Mul(a, b) => format!("({} * {})", render(a), render(b)),
        Expr::Neg(a) => format!("-{}", render(a)),
    }
}

/// Horner form of `c[0] + c[1]*x + c[2]*x^2 + ...`
fn polynomial<'g>(b: &Builder<'g>, coefficients: &[i64]) -> PoolBox<'g, Expr<'g>> {
    let mut acc = b.konst(*coefficients.last().unwrap_or(&0));
    for &c in coefficients.iter().rev().skip(1) {
        acc = b.add(b.mul(acc, b.var("x")), b.konst(c));
    }
    acc
}

fn main() {
    let mut pool = Pool::with_config(PoolConfig::small());

    println!("Building expression trees in {}", pool.id());

    for round in 1..=3 {
        {
            let guard = pool.attach();
            let b = Builder { guard: &guard };

            let coefficients: Vec<i64> = (0..round * 4).map(|i| i as i64 - 2).collect();
            let tree = b.neg(polynomial(&b, &coefficients));

            if round == 1 {
                println!("  f(x) = {}", render(&tree));
            }
            println!(
                "  round {}: f(3) = {}, live nodes = {}",
                round,
                eval(&tree, 3),
                guard.pool().stats().live_blocks
            );
        }

        assert!(pool.is_empty());
    }

    println!();
    print!("{}", pool.stats());
}
