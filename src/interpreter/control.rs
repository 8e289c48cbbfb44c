// SyntaxLang control flow: conditionals, loops, switch, try/catch

use super::{value_of, Evaluated, Interpreter, Outcome};
use crate::ast::BinaryOp;
use crate::error::{Span, SyntaxLangResult};
use crate::instruction::{
    Block, CaseInstruction, ForInstruction, ForeachInstruction, Instruction, SwitchInstruction,
    TryCatchInstruction, WhileInstruction,
};
use crate::runtime::{Scope, Signal, Value, ValueKind, Variable};
use std::rc::Rc;

/// What a loop does with the signal its body produced
enum LoopStep {
    Next,
    Exit(Signal),
}

/// Consume the break/continue signals addressed to a loop labelled `label`
fn loop_step(label: Option<&Rc<str>>, signal: Signal) -> LoopStep {
    match signal {
        Signal::None | Signal::Value(_) | Signal::Continue => LoopStep::Next,
        Signal::Break => LoopStep::Exit(Signal::None),
        Signal::ContinueLabel(ref target) if Some(target) == label => LoopStep::Next,
        Signal::BreakLabel(ref target) if Some(target) == label => LoopStep::Exit(Signal::None),
        other => LoopStep::Exit(other),
    }
}

impl Interpreter {
    /// Evaluate a condition: a Boolean, or an object converting through
    /// `__boolean`
    pub(crate) fn condition(
        &mut self,
        instruction: &Instruction,
        span: Span,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Outcome<bool>> {
        let value = value_of!(self.evaluate(instruction, scope));
        self.truthy(&value, span, scope)
    }

    pub(crate) fn if_chain(
        &mut self,
        branches: &[(Instruction, Block)],
        otherwise: Option<&Block>,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Signal> {
        for (condition, body) in branches {
            if value_of!(self.condition(condition, body.span, scope)) {
                return self.execute_block(body, scope);
            }
        }
        match otherwise {
            Some(body) => self.execute_block(body, scope),
            None => Ok(Signal::None),
        }
    }

    pub(crate) fn for_loop(&mut self, for_loop: &ForInstruction, scope: &Rc<Scope>) -> SyntaxLangResult<Signal> {
        let loop_scope = scope.build_child();
        for init in &for_loop.init {
            let value = value_of!(self.evaluate(&init.value, &loop_scope));
            loop_scope.declare_variable(Rc::new(Variable::new(
                init.name.clone(),
                value,
                init.is_final,
                init.span,
            )))?;
        }
        loop {
            if let Some(condition) = &for_loop.condition {
                if !value_of!(self.condition(condition, for_loop.span, &loop_scope)) {
                    break;
                }
            }
            let signal = self.execute_block(&for_loop.body, &loop_scope)?;
            if let LoopStep::Exit(signal) = loop_step(for_loop.label.as_ref(), signal) {
                return Ok(signal);
            }
            for update in &for_loop.update {
                value_of!(self.evaluate(update, &loop_scope));
            }
        }
        Ok(Signal::None)
    }

    pub(crate) fn while_loop(
        &mut self,
        while_loop: &WhileInstruction,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Signal> {
        let mut first = true;
        loop {
            if (while_loop.test_first || !first)
                && !value_of!(self.condition(&while_loop.condition, while_loop.span, scope))
            {
                break;
            }
            first = false;
            let signal = self.execute_block(&while_loop.body, scope)?;
            if let LoopStep::Exit(signal) = loop_step(while_loop.label.as_ref(), signal) {
                return Ok(signal);
            }
        }
        Ok(Signal::None)
    }

    pub(crate) fn foreach(&mut self, foreach: &ForeachInstruction, scope: &Rc<Scope>) -> SyntaxLangResult<Signal> {
        let iterable = value_of!(self.evaluate(&foreach.iterable, scope));
        let items: Vec<Value> = match iterable.kind() {
            ValueKind::List(values) => values.to_vec(),
            ValueKind::Map(map) => map.keys().cloned().collect(),
            ValueKind::String(text) => text
                .chars()
                .map(|c| Value::string(c.to_string()))
                .collect(),
            _ => {
                return Err(scope.error(
                    crate::error::ErrorKind::TypeMismatch,
                    format!("Cannot iterate over {}", iterable.type_name()),
                    foreach.span,
                ))
            }
        };
        for item in items {
            let iteration = scope.build_child();
            iteration.declare_variable(Rc::new(Variable::new(
                foreach.variable.clone(),
                item,
                false,
                foreach.span,
            )))?;
            let signal = self.execute_block(&foreach.body, &iteration)?;
            if let LoopStep::Exit(signal) = loop_step(foreach.label.as_ref(), signal) {
                return Ok(signal);
            }
        }
        Ok(Signal::None)
    }

    pub(crate) fn try_catch(
        &mut self,
        try_catch: &TryCatchInstruction,
        scope: &Rc<Scope>,
    ) -> SyntaxLangResult<Signal> {
        match self.execute_block(&try_catch.body, scope)? {
            Signal::Throw(error) => {
                tracing::trace!(kind = %error.kind, "caught exception");
                let handler_scope = scope.build_child();
                handler_scope.declare_variable(Rc::new(Variable::new(
                    try_catch.variable.clone(),
                    error.value,
                    false,
                    try_catch.span,
                )))?;
                self.execute_block(&try_catch.handler, &handler_scope)
            }
            signal => Ok(signal),
        }
    }

    /// Run a switch. Statement cases fall through from the first match (or
    /// `default`) until `break` or `yield`; an arrow case produces its value.
    /// Each statement case body gets its own scope.
    pub(crate) fn switch(&mut self, switch: &SwitchInstruction, scope: &Rc<Scope>) -> SyntaxLangResult<Evaluated> {
        let discriminant = value_of!(self.evaluate(&switch.discriminant, scope));
        let switch_scope = scope.build_child();

        let mut start = None;
        for (position, case) in switch.cases.iter().enumerate() {
            let Some(guard) = &case.guard else {
                continue;
            };
            let guard = value_of!(self.evaluate(guard, &switch_scope));
            let equal = value_of!(self.apply_binary(
                BinaryOp::Equal,
                discriminant.clone(),
                guard,
                case.span,
                &switch_scope
            ));
            if equal.as_boolean() == Some(true) {
                start = Some(position);
                break;
            }
        }
        let start = start.or_else(|| switch.cases.iter().position(|case| case.guard.is_none()));
        let Some(start) = start else {
            return Ok(Outcome::Done(Value::null()));
        };

        for case in &switch.cases[start..] {
            match &case.body {
                CaseInstruction::Value(value) => return self.evaluate(value, &switch_scope),
                CaseInstruction::Statements(statements) => {
                    match self.execute_statements(statements, &switch_scope.build_child())? {
                        Signal::None | Signal::Value(_) => continue,
                        Signal::Yield(value) => return Ok(Outcome::Done(value)),
                        Signal::Break => return Ok(Outcome::Done(Value::null())),
                        signal => return Ok(signal.into()),
                    }
                }
            }
        }
        Ok(Outcome::Done(Value::null()))
    }
}
