//! Contracts with blame.
//!
//! A [`Contract`] is a pair of projections keyed by a blame label: the
//! `server` projection blames the label when the *value* misbehaves, the
//! `client` projection blames it when the *context* does. Flat contracts
//! ([`flat`]) check a predicate on the spot; [`func`] contracts wrap a
//! candidate function and defer checking to each invocation, swapping
//! which projection guards arguments versus results so that the function
//! provider is blamed for bad results and the caller for bad arguments.
//!
//! Violations flow through [`blame`], which consults a thread-local
//! pluggable handler before producing a [`ContractError`].

use std::cell::RefCell;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::value::Value;

// =============================================================================
// Guarded values
// =============================================================================

type GuardedFn = dyn Fn(&[Guarded]) -> ContractResult<Guarded>;

/// The universe of values a contract can guard.
#[derive(Clone)]
pub enum Guarded {
    /// A plain data value.
    Value(Value),
    /// A callable, invoked through [`Guarded::call`].
    Func(Rc<GuardedFn>),
    /// A positional argument list.
    Tuple(Vec<Guarded>),
}

impl Guarded {
    /// Wraps a plain closure as a guarded function.
    pub fn func(f: impl Fn(&[Guarded]) -> ContractResult<Guarded> + 'static) -> Self {
        Self::Func(Rc::new(f))
    }

    /// Returns the underlying data value, if this is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Func(_) | Self::Tuple(_) => None,
        }
    }

    /// Invokes a guarded function.
    ///
    /// # Errors
    ///
    /// Fails when `self` is not a function, or when the call itself
    /// reports a violation.
    pub fn call(&self, arguments: &[Guarded]) -> ContractResult<Guarded> {
        match self {
            Self::Func(inner) => inner(arguments),
            other => Err(ContractError::new(
                "<caller>",
                other.to_string(),
                "a function",
            )),
        }
    }
}

impl PartialEq for Guarded {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(left), Self::Value(right)) => left == right,
            (Self::Tuple(left), Self::Tuple(right)) => left == right,
            (Self::Func(left), Self::Func(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Display for Guarded {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(formatter, "{value}"),
            Self::Func(_) => formatter.write_str("<function>"),
            Self::Tuple(items) => {
                formatter.write_str("(")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{item}")?;
                }
                formatter.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Guarded {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{self}")
    }
}

impl From<Value> for Guarded {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

// =============================================================================
// Violations and blame
// =============================================================================

/// A contract violation: who is at fault, what arrived, what was promised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    guilty: String,
    received: String,
    expected: String,
}

impl ContractError {
    /// Builds a violation report.
    pub fn new(
        guilty: impl Into<String>,
        received: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            guilty: guilty.into(),
            received: received.into(),
            expected: expected.into(),
        }
    }

    /// The blamed party's label.
    #[must_use]
    pub fn guilty(&self) -> &str {
        &self.guilty
    }

    /// A rendering of the offending value.
    #[must_use]
    pub fn received(&self) -> &str {
        &self.received
    }

    /// The violated contract's description.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

impl Display for ContractError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "contract violation: {} expected {}, got {}",
            self.guilty, self.expected, self.received
        )
    }
}

impl Error for ContractError {}

/// Result alias for contract checking.
pub type ContractResult<T> = std::result::Result<T, ContractError>;

type BlameHandler = Rc<dyn Fn(&str, &Guarded, &str)>;

thread_local! {
    static BLAME_HANDLER: RefCell<Option<BlameHandler>> = const { RefCell::new(None) };
}

/// Installs a handler observing every [`blame`] on this thread.
///
/// The handler runs before the [`ContractError`] is constructed; it can
/// log, count, or panic, but it cannot suppress the error.
pub fn set_blame_handler(handler: impl Fn(&str, &Guarded, &str) + 'static) {
    BLAME_HANDLER.with(|slot| *slot.borrow_mut() = Some(Rc::new(handler)));
}

/// Removes the handler installed by [`set_blame_handler`].
pub fn clear_blame_handler() {
    BLAME_HANDLER.with(|slot| *slot.borrow_mut() = None);
}

/// The central failure point of the contract system.
///
/// Notifies the thread-local handler, then returns the violation for the
/// caller to propagate.
#[must_use]
pub fn blame(guilty: &str, received: &Guarded, expected: &str) -> ContractError {
    BLAME_HANDLER.with(|slot| {
        if let Some(handler) = slot.borrow().as_ref() {
            handler(guilty, received, expected);
        }
    });
    ContractError::new(guilty, received.to_string(), expected)
}

// =============================================================================
// Contracts
// =============================================================================

/// A label-keyed wrapping function produced by one side of a contract.
pub type Projection = Rc<dyn Fn(Guarded) -> ContractResult<Guarded>>;

type ProjectionMaker = Rc<dyn Fn(&str) -> Projection>;
type FirstOrderPred = Rc<dyn Fn(&Guarded) -> bool>;

#[derive(Clone, Copy)]
enum Side {
    Server,
    Client,
}

/// A projection pair plus a first-order predicate for cheap dispatch.
#[derive(Clone)]
pub struct Contract {
    server: ProjectionMaker,
    client: ProjectionMaker,
    first_order: FirstOrderPred,
    is_first_order: bool,
    friendly: String,
}

impl Contract {
    /// The projection blaming `label` when the value misbehaves.
    #[must_use]
    pub fn server(&self, label: &str) -> Projection {
        (self.server)(label)
    }

    /// The projection blaming `label` when the context misbehaves.
    #[must_use]
    pub fn client(&self, label: &str) -> Projection {
        (self.client)(label)
    }

    fn projection(&self, side: Side, label: &str) -> Projection {
        match side {
            Side::Server => self.server(label),
            Side::Client => self.client(label),
        }
    }

    /// Runs the first-order predicate without projecting.
    #[must_use]
    pub fn check_first_order(&self, candidate: &Guarded) -> bool {
        (self.first_order)(candidate)
    }

    /// Whether the whole contract is checkable up front.
    #[must_use]
    pub const fn is_first_order(&self) -> bool {
        self.is_first_order
    }

    /// The human-readable description used in blame reports.
    #[must_use]
    pub fn friendly(&self) -> &str {
        &self.friendly
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Contract")
            .field("friendly", &self.friendly)
            .field("is_first_order", &self.is_first_order)
            .finish_non_exhaustive()
    }
}

fn identity_projection(_label: &str) -> Projection {
    Rc::new(|candidate| Ok(candidate))
}

/// A first-order contract from a predicate.
///
/// Its `server` projection checks the predicate and blames on failure;
/// its `client` projection is the identity, since a flat contract only
/// constrains values flowing in the server direction.
pub fn flat(pred: impl Fn(&Guarded) -> bool + 'static, friendly: impl Into<String>) -> Contract {
    let friendly = friendly.into();
    let pred = Rc::new(pred);
    let server = {
        let pred = Rc::clone(&pred);
        let friendly = friendly.clone();
        Rc::new(move |label: &str| -> Projection {
            let pred = Rc::clone(&pred);
            let friendly = friendly.clone();
            let label = label.to_owned();
            Rc::new(move |candidate: Guarded| {
                if pred(&candidate) {
                    Ok(candidate)
                } else {
                    Err(blame(&label, &candidate, &friendly))
                }
            })
        })
    };
    Contract {
        server,
        client: Rc::new(identity_projection),
        first_order: pred,
        is_first_order: true,
        friendly,
    }
}

fn func_maker(domain: Contract, range: Contract, friendly: String, side: Side) -> ProjectionMaker {
    Rc::new(move |label: &str| -> Projection {
        let label = label.to_owned();
        let domain = domain.clone();
        let range = range.clone();
        let friendly = friendly.clone();
        Rc::new(move |candidate: Guarded| match candidate {
            Guarded::Func(inner) => {
                // The projection guarding arguments flows against the
                // value direction, so the sides swap.
                let (argument_side, result_side) = match side {
                    Side::Server => (Side::Client, Side::Server),
                    Side::Client => (Side::Server, Side::Client),
                };
                let guard_arguments = domain.projection(argument_side, &label);
                let guard_result = range.projection(result_side, &label);
                let label = label.clone();
                let friendly = friendly.clone();
                Ok(Guarded::Func(Rc::new(move |call_arguments: &[Guarded]| {
                    match guard_arguments(Guarded::Tuple(call_arguments.to_vec()))? {
                        Guarded::Tuple(items) => guard_result(inner(&items)?),
                        other => Err(blame(&label, &other, &friendly)),
                    }
                })))
            }
            other => Err(blame(&label, &other, &friendly)),
        })
    })
}

/// A higher-order function contract.
///
/// Wrapping a candidate function defers checking to each invocation:
/// the argument list is guarded against `domain` and the result against
/// `range`. The first-order predicate only checks that the candidate is
/// a function at all.
#[must_use]
pub fn func(domain: Contract, range: Contract) -> Contract {
    let friendly = format!("{} -> {}", domain.friendly, range.friendly);
    Contract {
        server: func_maker(domain.clone(), range.clone(), friendly.clone(), Side::Server),
        client: func_maker(domain, range, friendly.clone(), Side::Client),
        first_order: Rc::new(|candidate| matches!(candidate, Guarded::Func(_))),
        is_first_order: false,
        friendly,
    }
}

fn tuple_maker(
    contracts: Vec<Contract>,
    rest: Option<Contract>,
    friendly: String,
    side: Side,
) -> ProjectionMaker {
    Rc::new(move |label: &str| -> Projection {
        let label = label.to_owned();
        let contracts = contracts.clone();
        let rest = rest.clone();
        let friendly = friendly.clone();
        Rc::new(move |candidate: Guarded| match candidate {
            Guarded::Tuple(items) => {
                let length_ok = if rest.is_some() {
                    items.len() >= contracts.len()
                } else {
                    items.len() == contracts.len()
                };
                if !length_ok {
                    return Err(blame(&label, &Guarded::Tuple(items), &friendly));
                }
                let mut projected = Vec::with_capacity(items.len());
                for (position, item) in items.into_iter().enumerate() {
                    match contracts.get(position).or(rest.as_ref()) {
                        Some(contract) => {
                            projected.push(contract.projection(side, &label)(item)?);
                        }
                        None => projected.push(item),
                    }
                }
                Ok(Guarded::Tuple(projected))
            }
            other => Err(blame(&label, &other, &friendly)),
        })
    })
}

fn tuple_contract(contracts: Vec<Contract>, rest: Option<Contract>, friendly: String) -> Contract {
    let is_first_order = contracts.iter().all(Contract::is_first_order)
        && rest.as_ref().is_none_or(Contract::is_first_order);
    let first_order = {
        let contracts = contracts.clone();
        let rest = rest.clone();
        Rc::new(move |candidate: &Guarded| match candidate {
            Guarded::Tuple(items) => {
                let length_ok = if rest.is_some() {
                    items.len() >= contracts.len()
                } else {
                    items.len() == contracts.len()
                };
                length_ok
                    && items.iter().enumerate().all(|(position, item)| {
                        contracts
                            .get(position)
                            .or(rest.as_ref())
                            .is_none_or(|contract| contract.check_first_order(item))
                    })
            }
            _ => false,
        })
    };
    Contract {
        server: tuple_maker(
            contracts.clone(),
            rest.clone(),
            friendly.clone(),
            Side::Server,
        ),
        client: tuple_maker(contracts, rest, friendly.clone(), Side::Client),
        first_order,
        is_first_order,
        friendly,
    }
}

fn friendly_list(contracts: &[Contract]) -> String {
    contracts
        .iter()
        .map(Contract::friendly)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A fixed-length positional argument-list contract.
#[must_use]
pub fn args(contracts: Vec<Contract>) -> Contract {
    let friendly = format!("args({})", friendly_list(&contracts));
    tuple_contract(contracts, None, friendly)
}

/// A variadic argument-list contract: the first positions are checked by
/// `contracts`, every remaining argument by `rest`. Fewer arguments than
/// `contracts.len()` is a violation.
#[must_use]
pub fn varargs(contracts: Vec<Contract>, rest: Contract) -> Contract {
    let friendly = format!(
        "varargs({}; {}...)",
        friendly_list(&contracts),
        rest.friendly
    );
    tuple_contract(contracts, Some(rest), friendly)
}

fn array_maker(element: Contract, friendly: String, side: Side) -> ProjectionMaker {
    Rc::new(move |label: &str| -> Projection {
        let label = label.to_owned();
        let element = element.clone();
        let friendly = friendly.clone();
        Rc::new(move |candidate: Guarded| match candidate {
            Guarded::Value(Value::Seq(items)) => {
                let projection = element.projection(side, &label);
                let mut projected = Vec::with_capacity(items.len());
                for item in items {
                    match projection(Guarded::Value(item))? {
                        Guarded::Value(value) => projected.push(value),
                        other => return Err(blame(&label, &other, &friendly)),
                    }
                }
                Ok(Guarded::Value(Value::Seq(projected)))
            }
            Guarded::Tuple(items) => {
                let projection = element.projection(side, &label);
                let projected = items
                    .into_iter()
                    .map(|item| projection(item))
                    .collect::<ContractResult<Vec<_>>>()?;
                Ok(Guarded::Tuple(projected))
            }
            other => Err(blame(&label, &other, &friendly)),
        })
    })
}

/// An elementwise array contract. First-order iff `element` is.
#[must_use]
pub fn array_of(element: Contract) -> Contract {
    let friendly = format!("array of {}", element.friendly);
    let is_first_order = element.is_first_order();
    let first_order = {
        let element = element.clone();
        Rc::new(move |candidate: &Guarded| match candidate {
            Guarded::Value(Value::Seq(items)) => items
                .iter()
                .all(|item| element.check_first_order(&Guarded::Value(item.clone()))),
            Guarded::Tuple(items) => items.iter().all(|item| element.check_first_order(item)),
            _ => false,
        })
    };
    Contract {
        server: array_maker(element.clone(), friendly.clone(), Side::Server),
        client: array_maker(element, friendly.clone(), Side::Client),
        first_order,
        is_first_order,
        friendly,
    }
}

fn any_maker(branches: Vec<Contract>, friendly: String, side: Side) -> ProjectionMaker {
    Rc::new(move |label: &str| -> Projection {
        let label = label.to_owned();
        let branches = branches.clone();
        let friendly = friendly.clone();
        Rc::new(move |candidate: Guarded| {
            for branch in branches.iter().filter(|branch| branch.is_first_order()) {
                if branch.check_first_order(&candidate) {
                    return branch.projection(side, &label)(candidate);
                }
            }
            if let Some(higher) = branches.iter().find(|branch| !branch.is_first_order()) {
                if higher.check_first_order(&candidate) {
                    return higher.projection(side, &label)(candidate);
                }
            }
            Err(blame(&label, &candidate, &friendly))
        })
    })
}

/// A disjunction of contracts.
///
/// First-order branches are tried left to right and the first whose
/// predicate matches wins, even when a later branch would also match.
/// If none match, the single permitted higher-order branch (if any, and
/// if its predicate matches) is used; otherwise the value is blamed.
///
/// # Errors
///
/// Fails at construction when more than one branch is higher-order.
pub fn any_of(branches: Vec<Contract>) -> ContractResult<Contract> {
    let higher_order = branches
        .iter()
        .filter(|branch| !branch.is_first_order())
        .count();
    if higher_order > 1 {
        return Err(ContractError::new(
            "any_of",
            format!("{higher_order} higher-order branches"),
            "at most one higher-order branch",
        ));
    }
    let friendly = format!("any of: {}", friendly_list(&branches));
    let is_first_order = higher_order == 0;
    let first_order = {
        let branches = branches.clone();
        Rc::new(move |candidate: &Guarded| {
            branches
                .iter()
                .any(|branch| branch.check_first_order(candidate))
        })
    };
    Ok(Contract {
        server: any_maker(branches.clone(), friendly.clone(), Side::Server),
        client: any_maker(branches, friendly.clone(), Side::Client),
        first_order,
        is_first_order,
        friendly,
    })
}
