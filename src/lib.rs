//! Private access control lists (PACL).
//!
//! A prover convinces two non-colluding verifiers that it holds a secret key
//! registered in a public list, without revealing which one, and that the
//! distributed point function (DPF) it supplied selects the same list
//! position. Three instantiations are provided, differing in the algebraic
//! domain of the audit:
//!
//! - [`keylist::sk`]: symmetric keys, XOR audit;
//! - [`keylist::pk`]: elliptic-curve public keys, point-sum audit;
//! - [`keylist::sposs`]: safe-prime-group public keys, verifiable DPF plus a
//!   distributed Schnorr-style argument ([`sposs`]).
pub mod algebra;
pub mod dpf;
pub mod ec;
pub mod keylist;
pub mod prg;
pub mod slot;
pub mod sposs;

pub use algebra::{default_group, Field, FieldElement, Group, GroupElement};
pub use dpf::{Dpf, HashKey, PrfKey, TreeDpf, VerifiableDpf};
pub use keylist::{KeyListParams, PredicateType};
pub use slot::Slot;
