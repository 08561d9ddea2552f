//! Arena index types. Every cross-reference between entities is one of
//! these newtypes rather than a pointer, per the store's "owning arena per
//! entity kind" design.

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(VariableId);
arena_id!(ExpressionId);
arena_id!(ConstraintId);
arena_id!(SelectionId);
