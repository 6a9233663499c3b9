pub mod node_tree;
