#![allow(dead_code)]

pub mod glb;
