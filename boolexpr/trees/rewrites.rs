//! Semantics-preserving rewrites. Every rewrite takes a tree and returns a
//! new one; untouched subtrees are shared with the input.
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::definitions::operators::is_symbolic;
use crate::definitions::Operator;
use crate::trees::node::{chain, ExpressionTreeNode, NodeKind, NodeRef};

/// Push negations of ANDs and ORs one level down using De Morgan's law.
///
/// The dual operator is spelled in the style of the negation being pushed
/// (`~(A and B)` becomes `~A \/ ~B`, `not (A & B)` becomes `not A or not B`).
#[must_use]
pub fn apply_de_morgans(node: &NodeRef) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary {
            spelling, child, ..
        } => match child.kind() {
            NodeKind::Binary {
                operator: operator @ (Operator::And | Operator::Or),
                left,
                right,
                ..
            } => {
                let dual = if *operator == Operator::And {
                    Operator::Or
                } else {
                    Operator::And
                };
                ExpressionTreeNode::binary(
                    dual,
                    dual.canonical_str(is_symbolic(spelling)),
                    apply_de_morgans(&ExpressionTreeNode::negation(*spelling, Arc::clone(left))),
                    apply_de_morgans(&ExpressionTreeNode::negation(*spelling, Arc::clone(right))),
                )
            }
            _ => ExpressionTreeNode::negation(*spelling, apply_de_morgans(child)),
        },
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => ExpressionTreeNode::binary(
            *operator,
            *spelling,
            apply_de_morgans(left),
            apply_de_morgans(right),
        ),
    }
}

/// Fold ANDs and ORs against the constants `0` and `1`, bottom-up.
#[must_use]
pub fn apply_identity_law(node: &NodeRef) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary {
            spelling, child, ..
        } => ExpressionTreeNode::negation(*spelling, apply_identity_law(child)),
        NodeKind::Binary {
            operator: operator @ (Operator::And | Operator::Or),
            spelling,
            left,
            right,
        } => {
            let left = apply_identity_law(left);
            let right = apply_identity_law(right);
            // `0` annihilates AND and `1` annihilates OR; the other constant is neutral.
            let annihilator = *operator == Operator::Or;

            match (left.constant_value(), right.constant_value()) {
                (Some(value), _) if value == annihilator => left,
                (_, Some(value)) if value == annihilator => right,
                (Some(_), _) => right,
                (_, Some(_)) => left,
                _ => ExpressionTreeNode::binary(*operator, *spelling, left, right),
            }
        }
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => ExpressionTreeNode::binary(
            *operator,
            *spelling,
            apply_identity_law(left),
            apply_identity_law(right),
        ),
    }
}

/// An operand under zero or more negations.
struct Literal<'a> {
    name: &'a str,
    negated: bool,
    // Spelling of the negation closest to the operand.
    spelling: &'static str,
}

impl<'a> Literal<'a> {
    fn of(node: &'a NodeRef) -> Option<Self> {
        let mut negated = false;
        let mut spelling = Operator::Not.canonical_str(true);
        let mut current = node;

        loop {
            match current.kind() {
                NodeKind::Operand(name) => {
                    return Some(Literal {
                        name: name.as_str(),
                        negated,
                        spelling,
                    })
                }
                NodeKind::Unary {
                    spelling: not, child, ..
                } => {
                    negated = !negated;
                    spelling = *not;
                    current = child;
                }
                NodeKind::Binary { .. } => return None,
            }
        }
    }

    fn key(&self) -> (&'a str, bool) {
        (self.name, self.negated)
    }

    fn to_node(&self) -> NodeRef {
        let operand = ExpressionTreeNode::operand(self.name);
        if self.negated {
            ExpressionTreeNode::negation(self.spelling, operand)
        } else {
            operand
        }
    }
}

/// Literals of the AND/OR chain rooted at `node`, or `None` when the chain
/// holds anything but negated operands.
fn chain_literals(node: &NodeRef, operator: Operator) -> Option<Vec<Literal<'_>>> {
    chain(node, operator).into_iter().map(Literal::of).collect()
}

/// Rebuild a right-nested chain such as `A and (B and C)`.
fn right_fold(operator: Operator, spelling: &'static str, nodes: Vec<NodeRef>) -> Option<NodeRef> {
    nodes
        .into_iter()
        .rev()
        .reduce(|acc, node| ExpressionTreeNode::binary(operator, spelling, node, acc))
}

/// Drop repeated literals from AND and OR chains: `A and ~~A and B` becomes `A and B`.
#[must_use]
pub fn apply_idempotent_law(node: &NodeRef) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary {
            spelling, child, ..
        } => ExpressionTreeNode::negation(*spelling, apply_idempotent_law(child)),
        NodeKind::Binary {
            operator: operator @ (Operator::And | Operator::Or),
            spelling,
            left,
            right,
        } => {
            let Some(literals) = chain_literals(node, *operator) else {
                return ExpressionTreeNode::binary(
                    *operator,
                    *spelling,
                    apply_idempotent_law(left),
                    apply_idempotent_law(right),
                );
            };

            let mut seen = FxHashSet::default();
            let unique: Vec<_> = literals
                .iter()
                .filter(|literal| seen.insert(literal.key()))
                .map(Literal::to_node)
                .collect();

            if unique.len() == literals.len() {
                return Arc::clone(node);
            }
            right_fold(*operator, *spelling, unique).unwrap_or_else(|| Arc::clone(node))
        }
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => ExpressionTreeNode::binary(
            *operator,
            *spelling,
            apply_idempotent_law(left),
            apply_idempotent_law(right),
        ),
    }
}

/// Collapse AND chains holding a literal and its negation to `0`, and OR chains to `1`.
#[must_use]
pub fn apply_inverse_law(node: &NodeRef) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary {
            spelling, child, ..
        } => ExpressionTreeNode::negation(*spelling, apply_inverse_law(child)),
        NodeKind::Binary {
            operator: operator @ (Operator::And | Operator::Or),
            spelling,
            left,
            right,
        } => {
            let Some(literals) = chain_literals(node, *operator) else {
                return ExpressionTreeNode::binary(
                    *operator,
                    *spelling,
                    apply_inverse_law(left),
                    apply_inverse_law(right),
                );
            };

            let keys: FxHashSet<_> = literals.iter().map(Literal::key).collect();
            let complementary = keys
                .iter()
                .any(|(name, negated)| keys.contains(&(*name, !*negated)));

            if complementary {
                ExpressionTreeNode::constant(*operator == Operator::Or)
            } else {
                Arc::clone(node)
            }
        }
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => ExpressionTreeNode::binary(
            *operator,
            *spelling,
            apply_inverse_law(left),
            apply_inverse_law(right),
        ),
    }
}

/// Collapse runs of negations by parity, keeping the spelling of the negation
/// closest to the operand. Negated constants are folded (`~0` becomes `1`).
#[must_use]
pub fn coalesce_negations(node: &NodeRef) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary { .. } => {
            let mut odd = false;
            let mut innermost = Operator::Not.canonical_str(true);
            let mut current = node;
            while let NodeKind::Unary {
                spelling, child, ..
            } = current.kind()
            {
                odd = !odd;
                innermost = *spelling;
                current = child;
            }

            let base = coalesce_negations(current);
            if let Some(value) = base.constant_value() {
                return ExpressionTreeNode::constant(value != odd);
            }

            if odd {
                ExpressionTreeNode::negation(innermost, base)
            } else {
                base
            }
        }
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => ExpressionTreeNode::binary(
            *operator,
            *spelling,
            coalesce_negations(left),
            coalesce_negations(right),
        ),
    }
}

/// Distribute ANDs over ORs: `A and (B or C)` becomes `(A and B) or (A and C)`.
#[must_use]
pub fn distribute_ands(node: &NodeRef) -> NodeRef {
    distribute(node, Operator::And, Operator::Or)
}

/// Distribute ORs over ANDs: `A or (B and C)` becomes `(A or B) and (A or C)`.
#[must_use]
pub fn distribute_ors(node: &NodeRef) -> NodeRef {
    distribute(node, Operator::Or, Operator::And)
}

fn distribute(node: &NodeRef, outer: Operator, inner: Operator) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary {
            spelling, child, ..
        } => ExpressionTreeNode::negation(*spelling, distribute(child, outer, inner)),
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => {
            let left = distribute(left, outer, inner);
            let right = distribute(right, outer, inner);
            if *operator == outer {
                Distribution {
                    outer,
                    outer_spelling: *spelling,
                    inner,
                }
                .combine(&left, &right, false)
            } else {
                ExpressionTreeNode::binary(*operator, *spelling, left, right)
            }
        }
    }
}

struct Distribution {
    outer: Operator,
    outer_spelling: &'static str,
    inner: Operator,
}

impl Distribution {
    /// Combine two already distributed subtrees under the outer operator,
    /// splitting the right inner chain first and the left one second.
    fn combine(&self, left: &NodeRef, right: &NodeRef, distributed: bool) -> NodeRef {
        if let NodeKind::Binary {
            operator,
            spelling,
            left: first,
            right: rest,
        } = right.kind()
        {
            if *operator == self.inner {
                return join(
                    self.inner,
                    *spelling,
                    self.combine(left, first, true),
                    self.combine(left, rest, true),
                );
            }
        }

        if let NodeKind::Binary {
            operator,
            spelling,
            left: first,
            right: rest,
        } = left.kind()
        {
            if *operator == self.inner {
                return join(
                    self.inner,
                    *spelling,
                    self.combine(first, right, true),
                    self.combine(rest, right, true),
                );
            }
        }

        if distributed {
            join(
                self.outer,
                self.outer_spelling,
                Arc::clone(left),
                Arc::clone(right),
            )
        } else {
            ExpressionTreeNode::binary(
                self.outer,
                self.outer_spelling,
                Arc::clone(left),
                Arc::clone(right),
            )
        }
    }
}

/// Join two subtrees under an associative operator, re-associating a left
/// chain of the same operator to the right so that the result prints flat.
fn join(operator: Operator, spelling: &'static str, left: NodeRef, right: NodeRef) -> NodeRef {
    if let NodeKind::Binary {
        operator: op,
        spelling: chain_spelling,
        left: first,
        right: rest,
    } = left.kind()
    {
        if *op == operator {
            return ExpressionTreeNode::binary(
                operator,
                *chain_spelling,
                Arc::clone(first),
                join(operator, spelling, Arc::clone(rest), right),
            );
        }
    }

    ExpressionTreeNode::binary(operator, spelling, left, right)
}

/// Lower every operator to AND, OR and NOT.
///
/// Lowered operators and AND/OR nodes use the canonical spellings of the
/// style they were written in, so `A -> B` becomes `~A \/ B` and
/// `A impl B` becomes `not A or B`. Negations keep their spelling.
#[must_use]
pub fn to_primitives(node: &NodeRef) -> NodeRef {
    match node.kind() {
        NodeKind::Operand(..) => Arc::clone(node),
        NodeKind::Unary {
            spelling, child, ..
        } => ExpressionTreeNode::negation(*spelling, to_primitives(child)),
        NodeKind::Binary {
            operator,
            spelling,
            left,
            right,
        } => {
            let symbolic = is_symbolic(spelling);
            let not = |node: &NodeRef| {
                ExpressionTreeNode::negation(Operator::Not.canonical_str(symbolic), Arc::clone(node))
            };
            let and = |left: NodeRef, right: NodeRef| {
                ExpressionTreeNode::binary(
                    Operator::And,
                    Operator::And.canonical_str(symbolic),
                    left,
                    right,
                )
            };
            let or = |left: NodeRef, right: NodeRef| {
                ExpressionTreeNode::binary(
                    Operator::Or,
                    Operator::Or.canonical_str(symbolic),
                    left,
                    right,
                )
            };

            let left = to_primitives(left);
            let right = to_primitives(right);
            match operator {
                Operator::And => and(left, right),
                Operator::Or => or(left, right),
                Operator::Implies => or(not(&left), right),
                Operator::Nand => or(not(&left), not(&right)),
                Operator::Nor => and(not(&left), not(&right)),
                Operator::Xor => or(
                    and(Arc::clone(&left), not(&right)),
                    and(not(&left), Arc::clone(&right)),
                ),
                Operator::Xnor | Operator::Iff => or(
                    and(Arc::clone(&left), Arc::clone(&right)),
                    and(not(&left), not(&right)),
                ),
                Operator::Not => unreachable!("negation is never a binary node"),
            }
        }
    }
}

/// Convert to conjunctive normal form: lower to primitives, push negations
/// down to the operands, then distribute ORs over ANDs.
#[must_use]
#[tracing::instrument(skip_all)]
pub fn to_cnf(node: &NodeRef) -> NodeRef {
    let mut tree = to_primitives(node);

    let mut passes = 0;
    loop {
        passes += 1;
        let next = coalesce_negations(&apply_de_morgans(&tree));
        if next == tree {
            break;
        }
        tree = next;
    }
    tracing::debug!(passes, "negations pushed down to operands");

    while !tree.is_cnf() {
        let next = distribute_ors(&tree);
        if next == tree {
            tracing::warn!(tree = %tree, "distribution did not reach conjunctive normal form");
            break;
        }
        tree = next;
    }

    tree
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{
        apply_de_morgans, apply_idempotent_law, apply_identity_law, apply_inverse_law,
        coalesce_negations, distribute_ands, distribute_ors, to_cnf, to_primitives,
    };
    use crate::expressions::tokenizer::{to_postfix, tokenize};
    use crate::trees::node::{ExpressionTreeNode, NodeRef};

    fn parse(expr: &str) -> NodeRef {
        let tokens = tokenize(expr).unwrap().tokens;
        ExpressionTreeNode::from_postfix(&to_postfix(&tokens)).unwrap()
    }

    fn rewrite(rewrite: fn(&NodeRef) -> NodeRef, expr: &str) -> String {
        rewrite(&parse(expr)).to_string()
    }

    #[test]
    fn de_morgans() {
        assert_eq!(rewrite(apply_de_morgans, "not (A or B)"), "not A and not B");
        assert_eq!(rewrite(apply_de_morgans, "A nand B"), "A nand B");
        assert_eq!(rewrite(apply_de_morgans, "~A and B"), "~A and B");
        assert_eq!(rewrite(apply_de_morgans, "~(A and B)"), "~A \\/ ~B");
        assert_eq!(rewrite(apply_de_morgans, "(not (A and B))"), "not A or not B");
        assert_eq!(
            rewrite(apply_de_morgans, "not (~(A or B) and ~(C and D))"),
            "not (~A /\\ ~B) or not (~C \\/ ~D)"
        );
        assert_eq!(
            rewrite(apply_de_morgans, "~(A & B & C & D & E)"),
            "~A \\/ ~B \\/ ~C \\/ ~D \\/ ~E"
        );
        assert_eq!(
            rewrite(apply_de_morgans, "~(A and ~(B or ~(C and D) or D))"),
            "~A \\/ ~(~B /\\ ~(~C \\/ ~D) /\\ ~D)"
        );
    }

    #[test]
    fn identity_law() {
        assert_eq!(rewrite(apply_identity_law, "A and 0"), "0");
        assert_eq!(rewrite(apply_identity_law, "A and 1"), "A");
        assert_eq!(rewrite(apply_identity_law, "A or 1"), "1");
        assert_eq!(rewrite(apply_identity_law, "0 or A"), "A");
        assert_eq!(rewrite(apply_identity_law, "0 xor 1"), "0 xor 1");
        assert_eq!(rewrite(apply_identity_law, "(1 and (B or 1)) xor A"), "1 xor A");
        assert_eq!(
            rewrite(apply_identity_law, "(B -> (C and 0)) and (1 or (D and E))"),
            "B -> 0"
        );
        assert_eq!(rewrite(apply_identity_law, "1 and A and B and C"), "A and B and C");
        assert_eq!(rewrite(apply_identity_law, "~(A and 0)"), "~0");
    }

    #[test]
    fn idempotent_law() {
        assert_eq!(rewrite(apply_idempotent_law, "A and A"), "A");
        assert_eq!(
            rewrite(apply_idempotent_law, "A and B and A and ~~A and ~A"),
            "A and B and ~A"
        );
        assert_eq!(rewrite(apply_idempotent_law, "~~A and ~A"), "~~A and ~A");
        assert_eq!(
            rewrite(apply_idempotent_law, "(A or A or B) and (C xor D)"),
            "(A or B) and (C xor D)"
        );
        assert_eq!(
            rewrite(apply_idempotent_law, "A or not not not B or ~B"),
            "A or not B"
        );
        assert_eq!(rewrite(apply_idempotent_law, "A xor A"), "A xor A");
    }

    #[test]
    fn inverse_law() {
        assert_eq!(rewrite(apply_inverse_law, "A and ~A"), "0");
        assert_eq!(rewrite(apply_inverse_law, "A or B or ~~~B"), "1");
        assert_eq!(rewrite(apply_inverse_law, "A and ~~A"), "A and ~~A");
        assert_eq!(
            rewrite(
                apply_inverse_law,
                "(A xor B) or (A and ~A and B) or (~C or ~~~C or ~~C or D)"
            ),
            "(A xor B) or 0 or 1"
        );
        assert_eq!(rewrite(apply_inverse_law, "~(A or ~A)"), "~1");
    }

    #[test]
    fn coalescing() {
        for (expr, expected) in [
            ("~~A", "A"),
            ("~0", "1"),
            ("!!!1", "0"),
            ("not not not not not 0", "1"),
            ("~1 and ~0", "0 and 1"),
            ("~~~0 -> ~~0 -> ~0 -> 0", "1 -> 0 -> 1 -> 0"),
            ("~~~A", "~A"),
            ("~(A or B)", "~(A or B)"),
            ("~~(A && B)", "A && B"),
            ("~~ not(A -> B)", "not (A -> B)"),
            ("~ not ~ not !!(A iff B)", "A iff B"),
            (
                "! not not (~~(~A xor ~~~~~B) <-> (~~A nand !!!C))",
                "not ((~A xor ~B) <-> (A nand !C))",
            ),
        ] {
            assert_eq!(rewrite(coalesce_negations, expr), expected, "{expr}");
        }
    }

    #[test]
    fn distributing_ors() {
        for (expr, expected) in [
            ("A and B", "A and B"),
            (
                "A or (B and C and D and E and F)",
                "(A or B) and (A or C) and (A or D) and (A or E) and (A or F)",
            ),
            ("(A and B and C) or D", "(A or D) and (B or D) and (C or D)"),
            (
                "(B or C) or (E and F and G)",
                "(B or C or E) and (B or C or F) and (B or C or G)",
            ),
            (
                "(A -> B) or (A and B and C)",
                "((A -> B) or A) and ((A -> B) or B) and ((A -> B) or C)",
            ),
            (
                "A or (B and (C -> D) and (E or F or G))",
                "(A or B) and (A or (C -> D)) and (A or E or F or G)",
            ),
            (
                "(A and (B or C or D) and (E or F) and G) or I",
                "(A or I) and (B or C or D or I) and (E or F or I) and (G or I)",
            ),
            (
                "(A or B) or ((C or (D and E)) and F and (G or H or I))",
                "(A or B or C or D) and (A or B or C or E) and (A or B or F) and (A or B or G or H or I)",
            ),
        ] {
            assert_eq!(rewrite(distribute_ors, expr), expected, "{expr}");
        }
    }

    #[test]
    fn distributing_ands() {
        for (expr, expected) in [
            ("A or B", "A or B"),
            (
                "A and (B or C or D)",
                "(A and B) or (A and C) or (A and D)",
            ),
            (
                "(B and C) and (D or E)",
                "(B and C and D) or (B and C and E)",
            ),
            (
                "A and ((B xor C) or D or (E and F))",
                "(A and (B xor C)) or (A and D) or (A and E and F)",
            ),
        ] {
            assert_eq!(rewrite(distribute_ands, expr), expected, "{expr}");
        }
    }

    #[test]
    fn primitives() {
        for (expr, expected) in [
            ("A", "A"),
            ("~~A", "~~A"),
            ("A and B", "A and B"),
            ("A && B", "A /\\ B"),
            ("A impl B", "not A or B"),
            ("A -> B", "~A \\/ B"),
            ("A nand B", "not A or not B"),
            ("A nor B", "not A and not B"),
            ("A xor B", "(A and not B) or (not A and B)"),
            ("A xnor B", "(A and B) or (not A and not B)"),
            ("A <-> B", "(A /\\ B) \\/ (~A /\\ ~B)"),
            (
                "(A impl B) or C",
                "(not A or B) or C",
            ),
        ] {
            assert_eq!(rewrite(to_primitives, expr), expected, "{expr}");
        }
    }

    #[test]
    fn cnf() {
        assert_eq!(rewrite(to_cnf, "A or B or C"), "A or B or C");
        assert_eq!(rewrite(to_cnf, "~(A or B)"), "~A /\\ ~B");
        assert_eq!(
            rewrite(to_cnf, "A xor B"),
            "(A or not A) and (not B or not A) and (A or B) and (not B or B)"
        );
        assert_eq!(rewrite(to_cnf, "~~(A -> B)"), "~A \\/ B");
        for expr in [
            "A xor B",
            "(A nand B) -> (C nor ~D)",
            "~(A iff (B or (C and ~~D)))",
            "A and (B or (C and (D or (E and F))))",
            "1 xor A",
        ] {
            assert!(to_cnf(&parse(expr)).is_cnf(), "{expr}");
        }
    }
}
