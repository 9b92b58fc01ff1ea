mod pub_sub;
mod transactions;
