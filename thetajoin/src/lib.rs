//! ## Background
//!
//! A theta-join joins two relations `S` and `T` on an arbitrary predicate, for example
//! `s.price < t.price` or a band condition on dates. Unlike an equality join, there is no key
//! that hash partitioning can use to co-locate matching tuples, so a parallel theta-join must
//! in principle consider every pair of the Cartesian product `S x T`.
//!
//! The join-matrix model [1] views that Cartesian product as a 2-D grid: rows are (buckets of)
//! tuples of one relation and columns are (buckets of) tuples of the other. Assigning every cell
//! of the grid to exactly one worker guarantees that every candidate pair meets at some worker.
//! A tuple is replicated to every worker whose region crosses its row (or column), so the
//! shape of the regions decides the cost of the join: the area of a region approximates the
//! compute load of its worker, and its half-perimeter approximates the input that must be shipped
//! to it. Square regions minimize replication for a fixed load, which is why the default tiling is
//! a grid as close to square as the worker count permits.
//!
//! In a streaming engine [2] tuples are not available upfront, so the partition is computed once
//! from cardinality estimates, and at runtime each tuple is routed by sampling an index in its
//! relation's domain.
//!
//! ## Design
//!
//! * [`matrix`] The join space: shape, relation sizes and orientation.
//! * [`partition`] Parts, partitions, cost metrics and the routing query.
//! * [`strategy`] Pluggable tiling strategies.
//! * [`cost`] Cost values used to compare candidate partitions.
//! * [`sampler`] Explicit randomness and key hashing for routing.
//! * [`config`] Construction contract, loadable from yaml.
//!
//! ## Reference
//!
//! 1. Okcan, A. and Riedewald, M., 2011, June. Processing theta-joins using MapReduce. In
//! Proceedings of the 2011 ACM SIGMOD International Conference on Management of data
//! (pp. 949-960).
//! 2. Elseidy, M., Elguindy, A., Vitorovic, A. and Koch, C., 2014. Scalable and adaptive online
//! joins. Proceedings of the VLDB Endowment, 7(6), pp.441-452.

#[macro_use]
extern crate prettytable;

pub mod config;
pub mod cost;
pub mod error;
pub mod matrix;
pub mod partition;
pub mod sampler;
pub mod strategy;
#[cfg(test)]
mod test_utils;
