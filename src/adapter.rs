//! Per-arity adapter shims.
//!
//! An override is registered as an ordinary closure. The shims implemented here
//! erase its signature behind [`Override`], checking and downcasting arguments in
//! declared order and spreading its return value into results.

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CallError;
use crate::value::Value;

/// Signature-erased override callable.
pub trait Override: Send + Sync {
    /// Number of arguments the callable accepts.
    fn params(&self) -> usize;

    /// Number of results the callable reports.
    fn results(&self) -> usize;

    fn call(&self, args: Vec<Value>) -> Result<Vec<Value>, CallError>;
}

/// Conversion of a typed closure into a signature-erased [`Override`].
///
/// `Args` is the closure's argument tuple; it only exists to keep the
/// per-arity implementations apart.
pub trait IntoOverride<Args> {
    fn into_override(self) -> Arc<dyn Override>;
}

/// How a closure's return value reports results.
///
/// `()` reports none, tuples report one result per element, and every other
/// implementing type reports itself as a single result. Use
/// [`single_result!`](crate::single_result) for your own types, or wrap the
/// value in a one-element tuple.
///
/// The intercepted side sees through tuple syntax only, not type aliases: a
/// function returning `Pair` where `type Pair = (String, String)` declares one
/// result, so its override must return `((a, b),)`.
pub trait Returns: 'static {
    const ARITY: usize;

    fn into_values(self) -> Vec<Value>;
}

impl Returns for () {
    const ARITY: usize = 0;

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! impl_returns_for_tuple {
    ($arity:literal; $($T:ident $v:ident),+) => {
        impl<$($T: Any),+> Returns for ($($T,)+) {
            const ARITY: usize = $arity;

            fn into_values(self) -> Vec<Value> {
                let ($($v,)+) = self;
                vec![$(Value::new($v)),+]
            }
        }
    };
}

impl_returns_for_tuple!(1; T0 v0);
impl_returns_for_tuple!(2; T0 v0, T1 v1);
impl_returns_for_tuple!(3; T0 v0, T1 v1, T2 v2);
impl_returns_for_tuple!(4; T0 v0, T1 v1, T2 v2, T3 v3);
impl_returns_for_tuple!(5; T0 v0, T1 v1, T2 v2, T3 v3, T4 v4);
impl_returns_for_tuple!(6; T0 v0, T1 v1, T2 v2, T3 v3, T4 v4, T5 v5);
impl_returns_for_tuple!(7; T0 v0, T1 v1, T2 v2, T3 v3, T4 v4, T5 v5, T6 v6);
impl_returns_for_tuple!(8; T0 v0, T1 v1, T2 v2, T3 v3, T4 v4, T5 v5, T6 v6, T7 v7);

/// Implement [`Returns`] for types that report a single result.
#[macro_export]
macro_rules! single_result {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::runtime::Returns for $ty {
                const ARITY: usize = 1;

                fn into_values(self) -> ::std::vec::Vec<$crate::runtime::Value> {
                    ::std::vec![$crate::runtime::Value::new(self)]
                }
            }
        )+
    };
}

crate::single_result!(
    String,
    &'static str,
    Cow<'static, str>,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    PathBuf,
    OsString,
    Duration,
);

macro_rules! impl_single_result_generic {
    ($($ty:ident<$($P:ident),+>),+ $(,)?) => {
        $(
            impl<$($P: Any),+> Returns for $ty<$($P),+> {
                const ARITY: usize = 1;

                fn into_values(self) -> Vec<Value> {
                    vec![Value::new(self)]
                }
            }
        )+
    };
}

impl_single_result_generic!(
    Vec<T>,
    VecDeque<T>,
    Option<T>,
    Result<T, E>,
    Box<T>,
    Rc<T>,
    Arc<T>,
    HashMap<K, V>,
    BTreeMap<K, V>,
    HashSet<T>,
    BTreeSet<T>,
);

/// A closure adapted to [`Override`].
pub struct FnOverride<F, Args, R> {
    f: F,
    _signature: PhantomData<fn(Args) -> R>,
}

macro_rules! impl_into_override {
    ($count:literal $(; $($A:ident $a:ident $pos:literal),+)?) => {
        impl<F, R $($(, $A)+)?> Override for FnOverride<F, ($($($A,)+)?), R>
        where
            F: Fn($($($A),+)?) -> R + Send + Sync + 'static,
            R: Returns,
            $($($A: Any,)+)?
        {
            fn params(&self) -> usize {
                $count
            }

            fn results(&self) -> usize {
                R::ARITY
            }

            fn call(&self, args: Vec<Value>) -> Result<Vec<Value>, CallError> {
                let found = args.len();
                let [$($($a,)+)?]: [Value; $count] = args
                    .try_into()
                    .map_err(|_| CallError::ArgumentCount { expected: $count, found })?;
                $($(
                    let $a = $a.downcast::<$A>().map_err(|value| CallError::ArgumentType {
                        position: $pos,
                        expected: type_name::<$A>(),
                        found: value.type_name(),
                    })?;
                )+)?
                Ok((self.f)($($($a),+)?).into_values())
            }
        }

        impl<F, R $($(, $A)+)?> IntoOverride<($($($A,)+)?)> for F
        where
            F: Fn($($($A),+)?) -> R + Send + Sync + 'static,
            R: Returns,
            $($($A: Any,)+)?
        {
            fn into_override(self) -> Arc<dyn Override> {
                Arc::new(FnOverride::<F, ($($($A,)+)?), R> {
                    f: self,
                    _signature: PhantomData,
                })
            }
        }
    };
}

impl_into_override!(0);
impl_into_override!(1; A0 a0 0);
impl_into_override!(2; A0 a0 0, A1 a1 1);
impl_into_override!(3; A0 a0 0, A1 a1 1, A2 a2 2);
impl_into_override!(4; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3);
impl_into_override!(5; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4);
impl_into_override!(6; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5);
impl_into_override!(7; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5, A6 a6 6);
impl_into_override!(8; A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5, A6 a6 6, A7 a7 7);
